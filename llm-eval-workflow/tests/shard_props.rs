use llm_eval_core::Topology;
use llm_eval_workflow::shard_indices;
use proptest::prelude::*;

proptest! {
    #[test]
    fn shards_partition_the_dataset(n in 0usize..200, batch_size in 1usize..9, world_size in 1usize..9) {
        let mut seen = vec![0u32; n];
        for topology in Topology::all(world_size).unwrap() {
            let shard = shard_indices(n, batch_size, topology).unwrap();
            for &index in &shard.indices {
                prop_assert!(index < n);
                seen[index] += 1;
            }
        }
        prop_assert!(seen.iter().all(|&count| count == 1));
    }

    #[test]
    fn batches_are_contiguous_blocks(n in 1usize..200, batch_size in 1usize..9, world_size in 1usize..9, rank_seed in 0usize..100) {
        let topology = Topology::new(world_size, rank_seed % world_size).unwrap();
        let shard = shard_indices(n, batch_size, topology).unwrap();

        for batch in shard.batches() {
            let block = batch[0] / batch_size;
            prop_assert_eq!(block % world_size, topology.local_rank());
            prop_assert!(batch.len() <= batch_size);
            for pair in batch.windows(2) {
                prop_assert_eq!(pair[1], pair[0] + 1);
                prop_assert_eq!(pair[1] / batch_size, block);
            }
        }
        prop_assert_eq!(shard.batches().count(), shard.num_batches());
    }
}

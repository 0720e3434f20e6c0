// Copyright 2025 RISC Zero, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

/// Block numbers of the most recent `count` epoch boundaries at or before `current_block`,
/// newest first.
///
/// A boundary is the last block of an epoch: `block % epoch_length == epoch_length - 1`. Block 0
/// is never returned, so a chain that is too young yields fewer than `count` blocks.
pub fn sample_epoch_boundaries(current_block: u64, epoch_length: u64, count: usize) -> Vec<u64> {
    if epoch_length == 0 || count == 0 {
        return Vec::new();
    }

    // Latest boundary at or before the current block.
    let offset = current_block % epoch_length;
    let latest = if offset == epoch_length - 1 {
        Some(current_block)
    } else {
        current_block.checked_sub(offset + 1)
    };

    let mut blocks = Vec::new();
    let mut next = latest;
    while let Some(block) = next {
        if block == 0 || blocks.len() == count {
            break;
        }
        blocks.push(block);
        next = block.checked_sub(epoch_length);
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stops_before_negative_blocks() {
        assert_eq!(sample_epoch_boundaries(10_000, 3000, 4), vec![8999, 5999, 2999]);
    }

    #[test]
    fn test_current_block_on_boundary() {
        assert_eq!(sample_epoch_boundaries(8999, 3000, 2), vec![8999, 5999]);
        assert_eq!(sample_epoch_boundaries(9000, 3000, 2), vec![8999, 5999]);
    }

    #[test]
    fn test_count_limits_result() {
        let blocks = sample_epoch_boundaries(1_000_000, 3000, 100);
        assert_eq!(blocks.len(), 100);
        assert_eq!(blocks[0], 998_999);
        assert_eq!(blocks[99], 998_999 - 99 * 3000);
    }

    #[test]
    fn test_huge_count_is_bounded_by_chain_height() {
        assert_eq!(sample_epoch_boundaries(10_000, 3000, usize::MAX), vec![8999, 5999, 2999]);
        assert_eq!(sample_epoch_boundaries(u64::MAX, u64::MAX / 2, usize::MAX).len(), 2);
    }

    #[test]
    fn test_young_chain_has_no_boundaries() {
        assert!(sample_epoch_boundaries(0, 3000, 100).is_empty());
        assert!(sample_epoch_boundaries(2998, 3000, 100).is_empty());
        assert_eq!(sample_epoch_boundaries(2999, 3000, 100), vec![2999]);
    }

    #[test]
    fn test_degenerate_parameters() {
        assert!(sample_epoch_boundaries(10_000, 0, 10).is_empty());
        assert!(sample_epoch_boundaries(10_000, 3000, 0).is_empty());
        // With one-block epochs every block is a boundary except block 0.
        assert_eq!(sample_epoch_boundaries(3, 1, 10), vec![3, 2, 1]);
    }

    #[test]
    fn test_boundary_properties_hold() {
        for current_block in [0u64, 1, 2, 5, 17, 99, 100, 101, 2999, 3000, 12_345, 30_011] {
            for epoch_length in [1u64, 2, 3, 7, 100, 3000] {
                for count in [1usize, 2, 5, 100] {
                    let blocks = sample_epoch_boundaries(current_block, epoch_length, count);

                    assert!(blocks.iter().all(|b| b % epoch_length == epoch_length - 1));
                    assert!(blocks.iter().all(|&b| b > 0 && b <= current_block));
                    assert!(blocks.windows(2).all(|w| w[0] > w[1]));

                    let available = (1..=current_block)
                        .filter(|b| b % epoch_length == epoch_length - 1)
                        .count();
                    assert_eq!(blocks.len(), count.min(available));
                }
            }
        }
    }
}

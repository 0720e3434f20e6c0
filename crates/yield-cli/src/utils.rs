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

use alloy::primitives::U256;

/// Format a wei amount as whole SOMI with comma separators
pub fn format_somi(wei: U256) -> String {
    // SOMI has 18 decimals
    let divisor = U256::from(10u64).pow(U256::from(18));
    format!("{} SOMI", format_with_commas(&(wei / divisor).to_string()))
}

/// Format a rate as a percentage with two decimals
pub fn format_percent(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.2}%")
    } else {
        "overflow".to_string()
    }
}

/// Insert comma separators into a string of decimal digits
pub fn format_with_commas(digits: &str) -> String {
    let mut result = String::new();
    let mut count = 0;

    for ch in digits.chars().rev() {
        if count == 3 {
            result.insert(0, ',');
            count = 0;
        }
        result.insert(0, ch);
        count += 1;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_somi() {
        let one_somi = U256::from(10u64).pow(U256::from(18));
        assert_eq!(format_somi(U256::from(1000u64) * one_somi), "1,000 SOMI");
        assert_eq!(format_somi("788626950526189926000000".parse().unwrap()), "788,626 SOMI");
        assert_eq!(format_somi(U256::from(999u64)), "0 SOMI");
        assert_eq!(format_somi(U256::ZERO), "0 SOMI");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(12.3456), "12.35%");
        assert_eq!(format_percent(0.0), "0.00%");
        assert_eq!(format_percent(f64::INFINITY), "overflow");
    }

    #[test]
    fn test_format_with_commas() {
        assert_eq!(format_with_commas("0"), "0");
        assert_eq!(format_with_commas("100"), "100");
        assert_eq!(format_with_commas("1000"), "1,000");
        assert_eq!(format_with_commas("100000"), "100,000");
        assert_eq!(format_with_commas("1234567890"), "1,234,567,890");
    }
}

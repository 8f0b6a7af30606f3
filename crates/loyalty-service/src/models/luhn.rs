//! 订单号校验（Luhn 算法）

use crate::error::{LoyaltyError, Result};

/// 校验订单号
///
/// 订单号必须是非空的十进制数字串，且通过 Luhn 校验。
pub fn validate_order_number(number: &str) -> Result<()> {
    if number.is_empty() {
        return Err(LoyaltyError::InvalidOrderNumber("订单号为空".to_string()));
    }

    let mut sum: u32 = 0;
    // 从最右侧一位开始，偶数位（第 2、4…位）乘 2
    for (i, ch) in number.chars().rev().enumerate() {
        let digit = ch.to_digit(10).ok_or_else(|| {
            LoyaltyError::InvalidOrderNumber(format!("订单号包含非数字字符: {}", number))
        })?;

        let value = if i % 2 == 1 {
            let doubled = digit * 2;
            if doubled > 9 { doubled - 9 } else { doubled }
        } else {
            digit
        };
        sum += value;
    }

    if sum % 10 != 0 {
        return Err(LoyaltyError::InvalidOrderNumber(format!(
            "订单号未通过校验: {}",
            number
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_numbers() {
        assert!(validate_order_number("12345678903").is_ok());
        assert!(validate_order_number("79927398713").is_ok());
        assert!(validate_order_number("4561261212345467").is_ok());
        assert!(validate_order_number("0").is_ok());
    }

    #[test]
    fn test_invalid_checksum() {
        assert!(validate_order_number("12345678904").is_err());
        assert!(validate_order_number("79927398710").is_err());
    }

    #[test]
    fn test_rejects_non_digits() {
        assert!(validate_order_number("").is_err());
        assert!(validate_order_number("1234-5678903").is_err());
        assert!(validate_order_number(" 12345678903").is_err());
        assert!(validate_order_number("-12345678903").is_err());

        let err = validate_order_number("abc").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_ORDER_NUMBER");
    }

    #[test]
    fn test_long_numbers_are_not_truncated() {
        // 超过 i64 范围的订单号也按数字串校验
        let long_valid = "18".repeat(15) + "0";
        assert!(validate_order_number(&long_valid).is_ok());
        let long_invalid = "18".repeat(15) + "2";
        assert!(validate_order_number(&long_invalid).is_err());
    }
}

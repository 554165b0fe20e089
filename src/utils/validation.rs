use regex::Regex;
use std::sync::LazyLock;

use crate::error::{AppError, AppResult};

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

static PHONE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9\s\-\+\(\)]{8,20}$").expect("valid phone regex"));

pub const NAME_MAX_LEN: usize = 100;
pub const TEXT_MAX_LEN: usize = 500;
pub const EMAIL_MAX_LEN: usize = 254;
pub const MAX_PRIZE_QUANTITY: i32 = 1000;

/// 去除首尾空白及尖括号
pub fn sanitize_text(text: &str) -> String {
    text.trim().replace(['<', '>'], "")
}

/// 可选文本：清理后为空视为未填写
pub fn sanitize_optional(text: Option<&str>) -> Option<String> {
    text.map(sanitize_text).filter(|s| !s.is_empty())
}

pub fn validate_required(field: &str, value: &str, max_len: usize) -> AppResult<()> {
    if value.is_empty() {
        return Err(AppError::ValidationError(format!("{field} is required")));
    }
    validate_max_len(field, value, max_len)
}

pub fn validate_max_len(field: &str, value: &str, max_len: usize) -> AppResult<()> {
    if value.chars().count() > max_len {
        return Err(AppError::ValidationError(format!(
            "{field} must be at most {max_len} characters"
        )));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> AppResult<()> {
    if email.chars().count() > EMAIL_MAX_LEN || !EMAIL_REGEX.is_match(email) {
        return Err(AppError::ValidationError("Invalid email address".to_string()));
    }
    Ok(())
}

/// 电话可选；填写时 8-20 位, 只允许数字、空格、+、-、括号
pub fn validate_phone(phone: &str) -> AppResult<()> {
    if !PHONE_REGEX.is_match(phone) {
        return Err(AppError::ValidationError(
            "Invalid phone number format".to_string(),
        ));
    }
    Ok(())
}

/// 新建奖品时数量须在 1..=1000
pub fn validate_prize_quantity(quantity: i32) -> AppResult<()> {
    if !(1..=MAX_PRIZE_QUANTITY).contains(&quantity) {
        return Err(AppError::ValidationError(format!(
            "Prize quantity must be between 1 and {MAX_PRIZE_QUANTITY}"
        )));
    }
    Ok(())
}

/// 名称的最大字符数
pub const MAX_NAME_CHARS: usize = 100;

/// 校验教室或学生名称，返回去除首尾空白后的名称
pub fn validate_display_name(name: &str) -> Result<String, &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Name must not be empty");
    }
    if trimmed.chars().count() > MAX_NAME_CHARS {
        return Err("Name must be at most 100 characters");
    }
    Ok(trimmed.to_string())
}

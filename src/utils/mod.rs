pub mod ip;
pub mod user_agent;

/// token 字符集：大小写字母 + 数字
const TOKEN_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

pub fn generate_random_code(length: usize) -> String {
    use std::iter;

    iter::repeat_with(|| TOKEN_ALPHABET[rand::random_range(0..TOKEN_ALPHABET.len())] as char)
        .take(length)
        .collect()
}

/// 检查 token 是否只包含字母数字（路由层拒绝其它路径）
pub fn is_valid_click_token(token: &str) -> bool {
    !token.is_empty() && token.len() <= 64 && token.bytes().all(|b| b.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_random_code_length_and_alphabet() {
        for len in [1, 4, 12] {
            let code = generate_random_code(len);
            assert_eq!(code.len(), len);
            assert!(code.bytes().all(|b| TOKEN_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_is_valid_click_token() {
        assert!(is_valid_click_token("aB3x"));
        assert!(!is_valid_click_token(""));
        assert!(!is_valid_click_token("ab-c"));
        assert!(!is_valid_click_token("favicon.ico"));
        assert!(!is_valid_click_token(&"a".repeat(65)));
    }
}

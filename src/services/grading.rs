/// Case- and whitespace-insensitive exact match. No numeric tolerance.
pub(crate) fn grade(user_answer: &str, correct_answer: &str) -> bool {
    normalize(user_answer) == normalize(correct_answer)
}

pub(crate) fn normalize(answer: &str) -> String {
    answer.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::grade;

    #[test]
    fn ignores_case_and_surrounding_whitespace() {
        assert!(grade("  b ", "B"));
        assert!(grade("B", "b"));
        assert!(grade("6 n", "6 N"));
    }

    #[test]
    fn rejects_different_answers() {
        assert!(!grade("B", "C"));
        assert!(!grade("6.0 N", "6 N"));
        assert!(!grade("", "A"));
    }
}

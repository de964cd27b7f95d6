use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

static USERNAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.]{3,32}$").expect("valid username pattern"));

/// Usernames are 3-32 characters of letters, digits, `_` or `.`
pub fn is_valid_username(username: &str) -> bool {
    USERNAME_PATTERN.is_match(username)
}

const MAX_USERNAME_LEN: usize = 32;

/// Longest prefix of `base` that leaves room for `reserved` more characters
fn fit(base: &str, reserved: usize) -> String {
    base.chars().take(MAX_USERNAME_LEN.saturating_sub(reserved)).collect()
}

/// Alternative usernames offered when the requested one is taken.
///
/// Produces three candidates: the base with a number appended, a prefix of
/// the display name joined to the base, and the base with two random letters.
/// The base is shortened where needed so every candidate stays within 32 characters.
pub fn suggest_usernames<R: Rng + ?Sized>(rng: &mut R, display_name: &str, base: &str) -> Vec<String> {
    let clean_name: String = display_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();

    let mut suggestions = Vec::with_capacity(3);

    let number = rng.gen_range(1..=99);
    suggestions.push(format!("{}{}", fit(base, number.to_string().len()), number));

    if clean_name.len() >= 3 {
        let prefix = &clean_name[..3];
        let number = rng.gen_range(1..=99);
        let reserved = prefix.len() + number.to_string().len();
        suggestions.push(format!("{}{}{}", prefix, fit(base, reserved), number));
    } else {
        let number = rng.gen_range(100..=999);
        suggestions.push(format!("{}{}", fit(base, 3), number));
    }

    let letters: String = (0..2)
        .map(|_| (b'a' + rng.gen_range(0..26u8)) as char)
        .collect();
    suggestions.push(format!("{}_{}", fit(base, 3), letters));

    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_username_validation() {
        assert!(is_valid_username("iron_jane"));
        assert!(is_valid_username("j.doe42"));
        assert!(!is_valid_username("ab"));
        assert!(!is_valid_username("has space"));
        assert!(!is_valid_username(&"x".repeat(33)));
    }

    #[test]
    fn test_suggestions_follow_patterns() {
        let mut rng = StdRng::seed_from_u64(7);
        let suggestions = suggest_usernames(&mut rng, "Jane Doe", "lifter");

        assert_eq!(suggestions.len(), 3);

        let number: u32 = suggestions[0].trim_start_matches("lifter").parse().unwrap();
        assert!((1..=99).contains(&number));

        assert!(suggestions[1].starts_with("janlifter"));

        let (base, letters) = suggestions[2].split_once('_').unwrap();
        assert_eq!(base, "lifter");
        assert_eq!(letters.len(), 2);
        assert!(letters.chars().all(|c| c.is_ascii_lowercase()));
    }

    #[test]
    fn test_short_display_name_uses_three_digit_suffix() {
        let mut rng = StdRng::seed_from_u64(11);
        let suggestions = suggest_usernames(&mut rng, "J!", "runner");

        let number: u32 = suggestions[1].trim_start_matches("runner").parse().unwrap();
        assert!((100..=999).contains(&number));
    }

    #[test]
    fn test_suggestions_are_valid_usernames() {
        let mut rng = StdRng::seed_from_u64(3);
        for suggestion in suggest_usernames(&mut rng, "Max Power", "maxp") {
            assert!(is_valid_username(&suggestion), "{suggestion} should be valid");
        }
    }

    #[test]
    fn test_long_base_still_yields_valid_suggestions() {
        let base = "a".repeat(32);

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let suggestions = suggest_usernames(&mut rng, "Jane Doe", &base);

            assert_eq!(suggestions.len(), 3);
            for suggestion in &suggestions {
                assert!(is_valid_username(suggestion), "{suggestion} should be valid");
            }
        }
    }

    #[test]
    fn test_non_ascii_display_name_yields_valid_prefix() {
        let mut rng = StdRng::seed_from_u64(5);
        let suggestions = suggest_usernames(&mut rng, "Émile Zoë", "emile");

        assert!(suggestions[1].starts_with("mil"), "{}", suggestions[1]);
        for suggestion in &suggestions {
            assert!(is_valid_username(suggestion), "{suggestion} should be valid");
        }
    }
}

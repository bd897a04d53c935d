//! Probe content generation
//!
//! Builds prompts of a known character length. Every prompt starts with a
//! short random token so the server cannot match its prefix against a
//! previously cached prompt; only the explicit cache-reuse repeat sends the
//! same content twice.

use rand::Rng;

/// Filler corpus, repeated and truncated to the requested length
pub const FILLER_TEXT: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. \
Sed do eiusmod tempor incididunt ut labore et dolore magna aliqua. Ut enim ad minim \
veniam, quis nostrud exercitation ullamco laboris nisi ut aliquip ex ea commodo \
consequat. Duis aute irure dolor in reprehenderit in voluptate velit esse cillum \
dolore eu fugiat nulla pariatur. Excepteur sint occaecat cupidatat non proident, sunt \
in culpa qui officia deserunt mollit anim id est laborum. Curabitur pretium tincidunt \
lacus, nulla gravida orci a odio. Nullam varius, turpis et commodo pharetra, est eros \
bibendum elit, nec luctus magna felis sollicitudin mauris. Integer in mauris eu nibh \
euismod gravida. Duis ac tellus et risus vulputate vehicula. Donec lobortis risus a \
elit. Etiam tempor. Ut ullamcorper, ligula eu tempor congue, eros est euismod turpis, \
id tincidunt sapien risus a quam. Maecenas fermentum consequat mi. Donec fermentum. \
Pellentesque malesuada nulla a mi. Duis sapien sem, aliquet nec, commodo eget, \
consequat quis, neque. Aliquam faucibus, elit ut dictum aliquet, felis nisl adipiscing \
sapien, sed malesuada diam lacus eget erat. ";

/// Marker placed before the random token
pub const PREFIX_MARKER: &str = "seed:";

/// Default number of random characters in the prefix token
pub const DEFAULT_PREFIX_LENGTH: usize = 10;

const PREFIX_CHARSET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate a random lowercase alphanumeric token
pub fn random_token<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| PREFIX_CHARSET[rng.gen_range(0..PREFIX_CHARSET.len())] as char)
        .collect()
}

/// Filler text of exactly `length` characters
pub fn filler(length: usize) -> String {
    FILLER_TEXT.chars().cycle().take(length).collect()
}

/// Build probe content: `seed:<token>\n<filler><suffix>`
///
/// The filler is exactly `target_length` characters; a zero target yields an
/// empty filler while the prefix and suffix are still applied.
pub fn generate_probe_content<R: Rng + ?Sized>(
    rng: &mut R,
    target_length: usize,
    random_prefix_length: usize,
    suffix: &str,
) -> String {
    let token = random_token(rng, random_prefix_length);
    let mut content = String::with_capacity(
        PREFIX_MARKER.len() + token.len() + 1 + target_length + suffix.len(),
    );
    content.push_str(PREFIX_MARKER);
    content.push_str(&token);
    content.push('\n');
    content.push_str(&filler(target_length));
    content.push_str(suffix);
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_filler_exact_length() {
        assert_eq!(filler(0), "");
        assert_eq!(filler(5), "Lorem");
        assert_eq!(filler(10_000).chars().count(), 10_000);
        assert!(filler(FILLER_TEXT.len() + 3).starts_with(FILLER_TEXT));
    }

    #[test]
    fn test_content_layout() {
        let mut rng = StdRng::seed_from_u64(7);
        let content = generate_probe_content(&mut rng, 100, 10, "!end");

        assert!(content.starts_with(PREFIX_MARKER));
        assert!(content.ends_with("!end"));

        let (head, rest) = content.split_once('\n').unwrap();
        let token = &head[PREFIX_MARKER.len()..];
        assert_eq!(token.len(), 10);
        assert!(token.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        assert_eq!(rest.len(), 100 + "!end".len());
    }

    #[test]
    fn test_zero_length_keeps_prefix_and_suffix() {
        let mut rng = StdRng::seed_from_u64(1);
        let content = generate_probe_content(&mut rng, 0, 4, "tail");
        assert_eq!(content.len(), PREFIX_MARKER.len() + 4 + 1 + 4);
        assert!(content.ends_with("\ntail"));
    }

    #[test]
    fn test_same_seed_is_reproducible() {
        let a = generate_probe_content(&mut StdRng::seed_from_u64(42), 50, 10, "");
        let b = generate_probe_content(&mut StdRng::seed_from_u64(42), 50, 10, "");
        assert_eq!(a, b);
    }

    #[test]
    fn test_consecutive_calls_differ_in_prefix() {
        let mut rng = StdRng::seed_from_u64(3);
        let a = generate_probe_content(&mut rng, 50, 10, "");
        let b = generate_probe_content(&mut rng, 50, 10, "");
        assert_eq!(a.len(), b.len());
        assert_ne!(a, b);
    }
}

use anyhow::{Result, bail};
use std::collections::HashSet;

/// Seed used when the CLI resolves to nothing.
pub const DEFAULT_SEED: u64 = 1337;

/// Largest range a single `a..b` token may expand to.
const MAX_RANGE_LEN: u64 = 100_000;

/// Resolve CLI seed tokens into a de-duplicated, ordered seed list.
///
/// Accepts literal integers (negative values use their magnitude), half-open
/// ranges `a..b` and inclusive ranges `a..=b`.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut pending: Vec<u64> = Vec::new();

    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        if let Some((start, end)) = token.split_once("..") {
            let (end, inclusive) = match end.strip_prefix('=') {
                Some(end) => (end, true),
                None => (end, false),
            };
            pending.extend(expand_range(token, start, end, inclusive)?);
            continue;
        }

        if let Ok(value) = token.parse::<i64>() {
            pending.push(value.unsigned_abs());
            continue;
        }

        if let Ok(value) = token.parse::<u64>() {
            pending.push(value);
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    let mut seen = HashSet::new();
    let mut deduped: Vec<u64> = pending.into_iter().filter(|seed| seen.insert(*seed)).collect();

    if deduped.is_empty() {
        deduped.push(DEFAULT_SEED);
    }

    Ok(deduped)
}

fn expand_range(token: &str, start: &str, end: &str, inclusive: bool) -> Result<Vec<u64>> {
    let (Ok(start), Ok(end)) = (start.trim().parse::<u64>(), end.trim().parse::<u64>()) else {
        bail!("Unrecognized seed range: {token}");
    };
    let end = if inclusive { end.saturating_add(1) } else { end };
    if end <= start {
        bail!("Seed range {token} is empty");
    }
    if end - start > MAX_RANGE_LEN {
        bail!("Seed range {token} expands to more than {MAX_RANGE_LEN} seeds");
    }
    Ok((start..end).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn integers_and_ranges_expand_in_order() {
        let seeds = resolve_seed_inputs(&tokens(&["7", "1..4", "-2", "10..=11"])).unwrap();
        assert_eq!(seeds, vec![7, 1, 2, 3, 10, 11]);
    }

    #[test]
    fn duplicates_collapse_and_empty_defaults() {
        let seeds = resolve_seed_inputs(&tokens(&["3", "1..5", "3"])).unwrap();
        assert_eq!(seeds, vec![3, 1, 2, 4]);
        assert_eq!(resolve_seed_inputs(&tokens(&["", " "])).unwrap(), vec![DEFAULT_SEED]);
        assert_eq!(resolve_seed_inputs(&[]).unwrap(), vec![DEFAULT_SEED]);
    }

    #[test]
    fn rejects_garbage() {
        assert!(resolve_seed_inputs(&tokens(&["banana"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["5..2"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["a..b"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["0..1000000"])).is_err());
        assert_eq!(
            resolve_seed_inputs(&tokens(&["18446744073709551615"])).unwrap(),
            vec![u64::MAX]
        );
    }
}

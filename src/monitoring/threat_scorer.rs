use shared::ThreatLevel;

pub const MAX_SCORE: u8 = 100;

/// Scores above this are logged as a high-severity threat.
pub const HIGH_THREAT_LOG_SCORE: u8 = 50;

/// Additive heuristic over the current detection signals.
///
/// More than 10 modifications in the burst window adds 40, more than 5 adds 20.
/// A suspicious extension seen at any point adds 30, and so does any
/// high-entropy document.
pub fn score(burst_count: usize, has_suspicious_extension: bool, high_entropy_count: usize) -> u8 {
    let mut score: u32 = 0;

    if burst_count > 10 {
        score += 40;
    } else if burst_count > 5 {
        score += 20;
    }

    if has_suspicious_extension {
        score += 30;
    }

    if high_entropy_count > 0 {
        score += 30;
    }

    score.min(MAX_SCORE as u32) as u8
}

pub fn level(score: u8) -> ThreatLevel {
    match score {
        s if s > 70 => ThreatLevel::Critical,
        s if s > 40 => ThreatLevel::High,
        s if s > 20 => ThreatLevel::Medium,
        _ => ThreatLevel::Low,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_thresholds() {
        assert_eq!(score(0, false, 0), 0);
        assert_eq!(score(5, false, 0), 0);
        assert_eq!(score(6, false, 0), 20);
        assert_eq!(score(10, false, 0), 20);
        assert_eq!(score(11, false, 0), 40);
    }

    #[test]
    fn all_signals_saturate_at_maximum() {
        assert_eq!(score(1000, true, 1000), MAX_SCORE);
        assert_eq!(score(11, true, 1), 100);
        assert_eq!(score(6, true, 1), 80);
    }

    #[test]
    fn score_is_bounded_and_monotonic_in_each_input() {
        let bursts = [0usize, 1, 5, 6, 10, 11, 50];
        let counts = [0usize, 1, 2, 100];

        for &flag in &[false, true] {
            for &count in &counts {
                let mut previous = 0;
                for &burst in &bursts {
                    let s = score(burst, flag, count);
                    assert!(s <= MAX_SCORE);
                    assert!(s >= previous);
                    previous = s;
                }
            }
        }

        for &burst in &bursts {
            for &count in &counts {
                assert!(score(burst, true, count) >= score(burst, false, count));
            }
            for &flag in &[false, true] {
                let mut previous = 0;
                for &count in &counts {
                    let s = score(burst, flag, count);
                    assert!(s >= previous);
                    previous = s;
                }
            }
        }
    }

    #[test]
    fn level_boundaries_are_strict() {
        assert_eq!(level(0), ThreatLevel::Low);
        assert_eq!(level(20), ThreatLevel::Low);
        assert_eq!(level(21), ThreatLevel::Medium);
        assert_eq!(level(40), ThreatLevel::Medium);
        assert_eq!(level(41), ThreatLevel::High);
        assert_eq!(level(70), ThreatLevel::High);
        assert_eq!(level(71), ThreatLevel::Critical);
        assert_eq!(level(100), ThreatLevel::Critical);
    }
}

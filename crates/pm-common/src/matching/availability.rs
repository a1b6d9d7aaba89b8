/// Availability entries are "{Weekday} {daypart}" tokens. Each one maps to
/// an absolute interval on a single weekly minute timeline (0..10080) so
/// overlap between two profiles reduces to interval arithmetic.
pub type MinuteSpan = (u32, u32);

const MINUTES_PER_DAY: u32 = 1440;

fn day_index(day: &str) -> Option<u32> {
    match day {
        "Mon" => Some(0),
        "Tue" => Some(1),
        "Wed" => Some(2),
        "Thu" => Some(3),
        "Fri" => Some(4),
        "Sat" => Some(5),
        "Sun" => Some(6),
        _ => None,
    }
}

fn block_range(block: &str) -> Option<(u32, u32)> {
    match block {
        "morning" => Some((9 * 60, 12 * 60)),
        "afternoon" => Some((12 * 60, 17 * 60)),
        "evening" => Some((17 * 60, 21 * 60)),
        "night" => Some((21 * 60, 24 * 60)),
        _ => None,
    }
}

/// Parse availability tokens into a canonical, minimal span set: sorted,
/// with touching or overlapping spans coalesced. Unrecognized tokens are
/// dropped without complaint.
pub fn normalize_availability(entries: &[String]) -> Vec<MinuteSpan> {
    let mut spans: Vec<MinuteSpan> = Vec::new();

    for entry in entries {
        let mut parts = entry.split_whitespace();
        let (Some(day), Some(block), None) = (parts.next(), parts.next(), parts.next()) else {
            continue;
        };

        let (Some(day_idx), Some((start, end))) =
            (day_index(day), block_range(&block.to_ascii_lowercase()))
        else {
            continue;
        };

        let base = day_idx * MINUTES_PER_DAY;
        spans.push((base + start, base + end));
    }

    spans.sort_unstable();
    merge_spans(spans)
}

fn merge_spans(spans: Vec<MinuteSpan>) -> Vec<MinuteSpan> {
    let mut merged: Vec<MinuteSpan> = Vec::with_capacity(spans.len());

    for (start, end) in spans {
        match merged.last_mut() {
            Some((_, prev_end)) if start <= *prev_end => {
                *prev_end = (*prev_end).max(end);
            }
            _ => merged.push((start, end)),
        }
    }

    merged
}

/// Total intersection minutes between two span sets, via a sorted
/// two-pointer sweep.
pub fn overlap_minutes(a: &[MinuteSpan], b: &[MinuteSpan]) -> u32 {
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_unstable();
    b.sort_unstable();

    let (mut i, mut j, mut overlap) = (0, 0, 0);
    while i < a.len() && j < b.len() {
        let (s1, e1) = a[i];
        let (s2, e2) = b[j];
        let start = s1.max(s2);
        let end = e1.min(e2);
        if end > start {
            overlap += end - start;
        }
        if e1 < e2 {
            i += 1;
        } else {
            j += 1;
        }
    }

    overlap
}

fn total_minutes(spans: &[MinuteSpan]) -> u32 {
    spans
        .iter()
        .map(|(start, end)| end.saturating_sub(*start))
        .sum()
}

/// Pairwise count of intersecting span pairs. Feeds display text only; a
/// span of one profile crossing two of the other counts twice, so this is
/// a cosmetic count, not a canonical metric.
fn rough_overlap_blocks(a: &[MinuteSpan], b: &[MinuteSpan]) -> usize {
    a.iter()
        .flat_map(|(s1, e1)| {
            b.iter()
                .filter(move |(s2, e2)| e1.min(e2) > s1.max(s2))
        })
        .count()
}

/// Explanation metadata for the availability signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AvailabilitySignal {
    pub overlap_minutes: u32,
    pub overlap_blocks: usize,
}

/// Score weekly overlap between two canonical span sets. The ratio is
/// taken against the smaller of the two totals so a packed schedule does
/// not dilute a perfect fit; either side declaring nothing scores zero.
pub fn score_availability(
    mine: &[MinuteSpan],
    theirs: &[MinuteSpan],
) -> (f64, AvailabilitySignal) {
    if mine.is_empty() || theirs.is_empty() {
        return (0.0, AvailabilitySignal::default());
    }

    let overlap = overlap_minutes(mine, theirs);
    let denom = total_minutes(mine).min(total_minutes(theirs)).max(1);
    let ratio = (f64::from(overlap) / f64::from(denom)).clamp(0.0, 1.0);

    (
        ratio,
        AvailabilitySignal {
            overlap_minutes: overlap,
            overlap_blocks: rough_overlap_blocks(mine, theirs),
        },
    )
}

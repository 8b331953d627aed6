use std::collections::BTreeMap;

use crate::domain::model::{CollisionReport, SerialRange};
use crate::domain::ports::{RegistryStore, StatusLog};
use crate::utils::error::Result;

/// Scans a registry snapshot for data-quality problems that would make
/// lookups ambiguous.
///
/// A range whose start and end carry different alphabetic prefixes is
/// malformed: it is reported and left out of overlap testing. The remaining
/// ranges are grouped by prefix and every pair within a group is tested for
/// numeric interval overlap, inclusive on both ends.
///
/// The report is ordered most-recently-found first. Pairwise testing is
/// quadratic per group, which is fine at batch scale; this runs off the
/// request path and never blocks an import.
pub fn check_collisions(ranges: &[SerialRange]) -> CollisionReport {
    let mut problems = Vec::new();
    let mut groups: BTreeMap<String, Vec<(i64, u128, u128)>> = BTreeMap::new();

    for range in ranges {
        let (start_alpha, start_value) = range.start.split();
        let (end_alpha, end_value) = range.end.split();
        if start_alpha != end_alpha {
            problems.push(format!(
                "start serial and end serial of row {} start with different letters",
                range.id
            ));
        } else {
            groups
                .entry(start_alpha)
                .or_default()
                .push((range.id, start_value, end_value));
        }
    }

    for group in groups.values() {
        for i in 0..group.len() {
            for j in (i + 1)..group.len() {
                let (first_id, first_start, first_end) = group[i];
                let (second_id, second_start, second_end) = group[j];
                if collide(first_start, first_end, second_start, second_end) {
                    problems.push(format!(
                        "there is a collision between row ids {} and {}",
                        first_id, second_id
                    ));
                }
            }
        }
    }

    problems.reverse();
    CollisionReport { problems }
}

fn collide(first_start: u128, first_end: u128, second_start: u128, second_end: u128) -> bool {
    if second_start <= first_start && first_start <= second_end {
        return true;
    }
    if second_start <= first_end && first_end <= second_end {
        return true;
    }
    if first_start <= second_start && second_start <= first_end {
        return true;
    }
    if first_start <= second_end && second_end <= first_end {
        return true;
    }
    false
}

/// Loads the active range set, runs the collision scan and files the report
/// under the `db_check` status key for the operator page.
pub async fn run_db_check<S, L>(store: &S, status: &L) -> Result<CollisionReport>
where
    S: RegistryStore,
    L: StatusLog,
{
    let ranges = store.all_ranges().await?;
    let report = check_collisions(&ranges);
    if report.is_clean() {
        tracing::info!("db check finished: no problems found in {} ranges", ranges.len());
    } else {
        tracing::warn!(
            "db check finished: {} problems in {} ranges",
            report.problems.len(),
            ranges.len()
        );
    }
    status.set("db_check", &report.render()).await?;
    Ok(report)
}

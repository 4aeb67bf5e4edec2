use crate::models::{CanonicalStatus, Stage};

/// Stage names used when only the inventory-level status is known.
pub const CANONICAL_STAGES: [&str; 4] = ["Checkout", "Build", "Test", "Deploy"];

/// Maps a Jenkins ball colour (e.g. `blue`, `red_anime`, `disabled`) to a canonical status.
///
/// The `_anime` suffix marks a job that is building right now. It is checked before
/// the colour families because animated tokens also contain a terminal colour.
pub fn map_status(color: Option<&str>) -> CanonicalStatus {
    let Some(color) = color else {
        return CanonicalStatus::NotBuilt;
    };

    if color.contains("anime") {
        return CanonicalStatus::Running;
    }

    if color.contains("blue") {
        CanonicalStatus::Success
    } else if color.contains("red") {
        CanonicalStatus::Failure
    } else if color.contains("yellow") {
        CanonicalStatus::Unstable
    } else if color.contains("aborted") || color.contains("disabled") {
        CanonicalStatus::Aborted
    } else if color.contains("notbuilt") {
        CanonicalStatus::NotBuilt
    } else {
        CanonicalStatus::Unknown
    }
}

/// Maps a build `result` field. `None` means the build has not finished.
pub fn map_build_result(result: Option<&str>) -> Option<CanonicalStatus> {
    result.map(|result| match result {
        "SUCCESS" => CanonicalStatus::Success,
        "FAILURE" => CanonicalStatus::Failure,
        "UNSTABLE" => CanonicalStatus::Unstable,
        "ABORTED" => CanonicalStatus::Aborted,
        "NOT_BUILT" => CanonicalStatus::NotBuilt,
        _ => CanonicalStatus::Unknown,
    })
}

/// Maps a pipeline stage status as reported on the detail endpoints.
pub fn map_stage_status(status: Option<&str>) -> CanonicalStatus {
    match status {
        Some("SUCCESS") => CanonicalStatus::Success,
        Some("FAILED" | "FAILURE") => CanonicalStatus::Failure,
        Some("UNSTABLE") => CanonicalStatus::Unstable,
        Some("IN_PROGRESS" | "PAUSED_PENDING_INPUT") => CanonicalStatus::Running,
        Some("ABORTED") => CanonicalStatus::Aborted,
        Some("NOT_EXECUTED" | "NOT_BUILT") | None => CanonicalStatus::NotBuilt,
        Some(_) => CanonicalStatus::Unknown,
    }
}

/// Builds the representative stage list for a job whose per-stage detail was not queried.
/// Every stage carries the job's overall status.
pub fn synthesize_stages(status: CanonicalStatus) -> Vec<Stage> {
    CANONICAL_STAGES
        .iter()
        .map(|name| Stage {
            name: (*name).to_string(),
            status,
        })
        .collect()
}

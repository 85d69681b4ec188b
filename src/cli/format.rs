//! Output formatting for CLI display.

use guidepost::ApiRequest;
use guidepost::GuideState;
use guidepost::model::GuideType;

/// One-line summary of the current selection.
pub(super) fn format_selection(state: &GuideState) -> String {
    let Some(guide) = &state.current_guide else {
        return "No guide selected".to_string();
    };

    let kind = match guide.guide_type {
        GuideType::Default => "guide",
        GuideType::Tip => "tip",
    };
    let position = if state.current_step == 0 {
        "cued".to_string()
    } else {
        format!("step {} of {}", state.current_step, guide.steps.len())
    };
    let forced = if state.force_show { " (forced)" } else { "" };

    format!("Selected {kind} {}: {position}{forced}", guide.id)
}

pub(super) fn format_request(request: &ApiRequest) -> String {
    format!(
        "{} for project {} ({})",
        request.endpoint, request.project_id, request.path
    )
}

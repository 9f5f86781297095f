#[cfg(test)]
#[path = "render_test.rs"]
mod tests;

use crate::domain::models::ContentPart;
use crate::domain::models::ExecutionResult;
use crate::domain::models::Fragment;
use crate::domain::models::Message;
use crate::domain::models::Metric;
use crate::domain::models::Notice;
use crate::domain::models::PreviewState;
use crate::domain::models::Tab;

fn metric_lines(metrics: &[Metric]) -> Vec<String> {
    return metrics
        .iter()
        .map(|metric| return format!("- {}: {} ({})", metric.label, metric.value, metric.change))
        .collect();
}

/// Plain text body of a message, one numbered header line followed by its
/// content parts.
pub fn message(number: usize, message: &Message) -> String {
    let mut header = format!("[{number}] {}", message.role.to_string());
    if let Some(fragment) = &message.object {
        header = format!("{header} ({})", fragment.kind());
    }

    let mut lines = vec![header];
    for part in message.content.iter() {
        match part {
            ContentPart::Text { text } => lines.push(text.to_string()),
            ContentPart::Image { .. } => lines.push("[image]".to_string()),
            ContentPart::Code { text } => {
                lines.push("```".to_string());
                lines.push(text.to_string());
                lines.push("```".to_string());
            }
        }
    }

    return lines.join("\n");
}

/// Text summary of a fragment, standing in for its visual layout.
pub fn fragment(fragment: &Fragment) -> String {
    let mut lines = vec![];

    match fragment {
        Fragment::Code(code) => {
            if let Some(title) = &code.title {
                lines.push(title.to_string());
            }
            if let Some(description) = &code.description {
                lines.push(description.to_string());
            }
            if let Some(template) = &code.template {
                lines.push(format!("Template: {template}"));
            }
            if let Some(file_path) = &code.file_path {
                lines.push(format!("File: {file_path}"));
            }
            if let Some(dependencies) = &code.additional_dependencies {
                if !dependencies.is_empty() {
                    lines.push(format!("Dependencies: {}", dependencies.join(", ")));
                }
            }
        }
        Fragment::CameraFeed {
            store_name,
            cameras,
            ..
        } => {
            lines.push(format!("Cameras at {store_name}"));
            for camera in cameras.iter() {
                lines.push(format!("- {} {} ({})", camera.id, camera.location, camera.status));
            }
        }
        Fragment::Dashboard {
            store_name,
            period,
            metrics,
            ..
        } => {
            lines.push(format!("{store_name} dashboard, {period}"));
            lines.extend(metric_lines(metrics));
        }
        Fragment::SalesData {
            store_name,
            period,
            metrics,
            top_products,
            ..
        } => {
            lines.push(format!("{store_name} sales, {period}"));
            lines.extend(metric_lines(metrics));
            if !top_products.is_empty() {
                lines.push(format!("Top products: {}", top_products.join(", ")));
            }
        }
        Fragment::StaffManagement {
            store_name,
            shift,
            staff,
            ..
        } => {
            lines.push(format!("{store_name} staff, {shift}"));
            for member in staff.iter() {
                lines.push(format!("- {}, {} ({})", member.name, member.role, member.shift));
            }
        }
        Fragment::InventoryManagement {
            store_name, items, ..
        } => {
            lines.push(format!("{store_name} inventory"));
            for item in items.iter() {
                let mut line = format!(
                    "- {} {}: {} on hand, reorder at {}",
                    item.sku, item.name, item.on_hand, item.reorder_point
                );
                if item.needs_restock() {
                    line = format!("{line} [restock]");
                }
                lines.push(line);
            }
        }
        Fragment::CostAnalytics {
            store_name,
            period,
            categories,
            ..
        } => {
            lines.push(format!("{store_name} costs, {period}"));
            lines.extend(metric_lines(categories));
        }
        Fragment::Forecast {
            store_name,
            horizon,
            points,
            ..
        } => {
            lines.push(format!("{store_name} forecast, {horizon}"));
            lines.extend(metric_lines(points));
        }
        Fragment::Help { examples, .. } => {
            lines.push("Try asking:".to_string());
            for example in examples.iter() {
                lines.push(format!("- {example}"));
            }
        }
    }

    return lines.join("\n");
}

fn execution(result: &ExecutionResult) -> Vec<String> {
    let mut lines = vec![format!("Sandbox {} ({})", result.sbx_id, result.template)];
    if let Some(url) = &result.url {
        lines.push(format!("Running at {url}"));
    }
    for line in result.stdout.iter() {
        lines.push(format!("stdout: {line}"));
    }
    for line in result.stderr.iter() {
        lines.push(format!("stderr: {line}"));
    }
    if let Some(err) = &result.runtime_error {
        lines.push(format!("Runtime error: {err}"));
    }

    return lines;
}

pub fn preview(preview: &PreviewState) -> String {
    let fragment = match (&preview.fragment, preview.visible) {
        (Some(fragment), true) => fragment,
        _ => return "Nothing to preview.".to_string(),
    };

    let mut lines = vec![format!("Preview: {} [{}]", fragment.kind(), preview.selected_tab)];
    match preview.selected_tab {
        Tab::Code => {
            let code = fragment
                .as_code()
                .and_then(|code| return code.code.as_ref());
            match code {
                Some(code) => lines.push(code.to_string()),
                None => lines.push("This fragment has no code.".to_string()),
            }
        }
        Tab::Fragment => {
            lines.push(self::fragment(fragment));
            if preview.loading {
                lines.push("Starting sandbox...".to_string());
            }
            if let Some(result) = &preview.result {
                lines.extend(execution(result));
            }
        }
    }

    return lines.join("\n");
}

pub fn notice(notice: &Notice) -> String {
    match notice {
        Notice::AuthRequired => {
            return "Sign in with /login <user> [team] [token] to start generating.".to_string();
        }
        Notice::GenerationFailed(err) => return err.user_message(),
        Notice::SandboxFailed(err) => return format!("Sandbox failed: {err}"),
    }
}

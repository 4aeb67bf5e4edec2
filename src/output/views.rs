use std::fmt::Write;

use comfy_table::Cell;

use crate::models::{Build, BuildHistoryReport, Pipeline, PipelineDetail, Stage, TriggerResult};

use super::styling::{bright, bright_red, dim};
use super::tables::{
    create_table, cyan_header, duration_cell, result_cell, status_cell, timestamp_cell,
};

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", bright(emoji), bright(title).underlined());
}

fn stages_summary(stages: &[Stage]) -> String {
    stages
        .iter()
        .map(|stage| format!("{}: {}", stage.name, stage.status))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_pipelines(pipelines: &[Pipeline]) -> String {
    let mut output = String::new();
    add_section_header(&mut output, "🔧", "Pipelines");

    if pipelines.is_empty() {
        let _ = writeln!(output, "{}", dim("No jobs found"));
        return output;
    }

    let mut table = create_table();
    table.set_header(cyan_header(&[
        "Pipeline",
        "Status",
        "Stages",
        "Last Build",
        "Result",
        "Started",
        "Duration",
    ]));

    for pipeline in pipelines {
        let last = pipeline.last_build.as_ref();
        table.add_row(vec![
            Cell::new(&pipeline.name),
            status_cell(pipeline.status),
            Cell::new(stages_summary(&pipeline.stages)),
            Cell::new(last.map_or_else(|| "-".to_string(), |b| format!("#{}", b.number))),
            last.map_or_else(|| Cell::new("-"), |b| result_cell(b.result)),
            timestamp_cell(last.and_then(|b| b.timestamp)),
            duration_cell(last.and_then(|b| b.duration)),
        ]);
    }

    let _ = writeln!(output, "{table}");
    output
}

pub fn render_pipeline_detail(detail: &PipelineDetail) -> String {
    let mut output = String::new();
    add_section_header(&mut output, "🔧", &detail.name);

    let mut table = create_table();
    table.add_row(vec![Cell::new("Status"), status_cell(detail.status)]);
    table.add_row(vec![Cell::new("URL"), Cell::new(&detail.url)]);
    if !detail.stages.is_empty() {
        table.add_row(vec![Cell::new("Stages"), Cell::new(stages_summary(&detail.stages))]);
    }
    table.add_row(vec![
        Cell::new("Description"),
        Cell::new(detail.description.as_deref().unwrap_or("-")),
    ]);
    let _ = writeln!(output, "{table}");

    if let Some(build) = &detail.last_build {
        output.push_str(&render_build(build));
    }
    output
}

pub fn render_build(build: &Build) -> String {
    let mut output = String::new();
    add_section_header(
        &mut output,
        "🏗️",
        &format!("{} #{}", build.job_name, build.number),
    );

    let mut table = create_table();
    table.add_row(vec![Cell::new("Result"), result_cell(build.result)]);
    table.add_row(vec![Cell::new("Started"), timestamp_cell(build.timestamp)]);
    table.add_row(vec![Cell::new("Duration"), duration_cell(build.duration)]);
    let _ = writeln!(output, "{table}");

    if build.stages.is_empty() {
        let _ = writeln!(output, "{}", dim("No stage data reported"));
        return output;
    }

    let mut stages = create_table();
    stages.set_header(cyan_header(&["Stage", "Status"]));
    for stage in &build.stages {
        stages.add_row(vec![Cell::new(&stage.name), status_cell(stage.status)]);
    }
    let _ = writeln!(output, "{stages}");
    output
}

pub fn render_history(report: &BuildHistoryReport) -> String {
    let mut output = String::new();
    add_section_header(&mut output, "📜", "Build History");

    if report.entries.is_empty() {
        let _ = writeln!(output, "{}", dim("No builds found"));
    } else {
        let mut table = create_table();
        table.set_header(cyan_header(&["Job", "Build", "Result", "Started", "Duration"]));
        for entry in &report.entries {
            table.add_row(vec![
                Cell::new(&entry.job_name),
                Cell::new(format!("#{}", entry.number)),
                result_cell(entry.result),
                timestamp_cell(entry.timestamp),
                duration_cell(entry.duration),
            ]);
        }
        let _ = writeln!(output, "{table}");
    }

    for failure in &report.failures {
        let _ = writeln!(
            output,
            "{} {}: {}",
            bright_red("⚠"),
            failure.job_name,
            dim(&failure.error)
        );
    }

    output
}

pub fn render_trigger(result: &TriggerResult) -> String {
    format!("{} ({})", result.message, result.job_name)
}

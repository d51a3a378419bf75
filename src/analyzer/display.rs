//! # Display Module
//!
//! Text, summary and JSON renderings of a [`StackReport`], plus the rule
//! listing printed by `stackscope support`.

use crate::analyzer::rules::RuleMetadata;
use crate::analyzer::{Category, DetectedItem, StackReport, StackSummary};
use crate::error::Result;
use colored::*;

const LABEL_WIDTH: usize = 22;

#[derive(Debug, Clone)]
enum BoxLine {
    Entry { label: String, value: String },
    Text(String),
    Separator,
}

/// Draws a titled box sized to its widest line.
pub struct BoxDrawer {
    title: String,
    lines: Vec<BoxLine>,
    min_width: usize,
    max_width: usize,
}

impl BoxDrawer {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            lines: Vec::new(),
            min_width: 56,
            max_width: 110,
        }
    }

    pub fn add_line(&mut self, label: &str, value: &str) {
        self.lines.push(BoxLine::Entry {
            label: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn add_text(&mut self, text: &str) {
        self.lines.push(BoxLine::Text(text.to_string()));
    }

    pub fn add_separator(&mut self) {
        self.lines.push(BoxLine::Separator);
    }

    fn content_width(&self) -> usize {
        let widest = self
            .lines
            .iter()
            .map(|line| match line {
                BoxLine::Entry { label, value } => {
                    visual_width(label).max(LABEL_WIDTH) + 1 + visual_width(value)
                }
                BoxLine::Text(text) => visual_width(text),
                BoxLine::Separator => 0,
            })
            .max()
            .unwrap_or(0);

        let title = visual_width(&self.title) + 2;
        (widest.max(title) + 4).clamp(self.min_width, self.max_width) - 4
    }

    pub fn draw(&self) -> String {
        let width = self.content_width();
        let mut output = Vec::with_capacity(self.lines.len() + 2);

        let title_fill = width.saturating_sub(visual_width(&self.title) + 1);
        output.push(format!("┌─ {} {}┐", self.title.bright_cyan(), "─".repeat(title_fill)));

        for line in &self.lines {
            let content = match line {
                BoxLine::Entry { label, value } => {
                    let padding = LABEL_WIDTH.saturating_sub(visual_width(label));
                    format!("{}{} {}", label.bright_white(), " ".repeat(padding), value)
                }
                BoxLine::Text(text) => text.clone(),
                BoxLine::Separator => "─".repeat(width).dimmed().to_string(),
            };
            output.push(format!("│ {} │", fit_to_width(&content, width)));
        }

        output.push(format!("└{}┘", "─".repeat(width + 2)));
        output.join("\n")
    }
}

/// Printable width, ignoring ANSI color sequences.
fn visual_width(s: &str) -> usize {
    strip_ansi_codes(s).chars().count()
}

fn strip_ansi_codes(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            for c in chars.by_ref() {
                if c.is_ascii_alphabetic() {
                    break;
                }
            }
        } else {
            result.push(ch);
        }
    }
    result
}

/// Pads to exactly `width` columns, cutting with `...` when too long.
/// Cut lines lose their colors.
fn fit_to_width(s: &str, width: usize) -> String {
    let current = visual_width(s);
    if current <= width {
        return format!("{}{}", s, " ".repeat(width - current));
    }

    let mut cut: String = strip_ansi_codes(s)
        .chars()
        .take(width.saturating_sub(3))
        .collect();
    cut.push_str("...");
    fit_to_width(&cut, width)
}

/// Output format of `stackscope analyze`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    Text,
    Summary,
    Json,
}

pub fn display_report(report: &StackReport, mode: DisplayMode) -> Result<()> {
    let rendered = match mode {
        DisplayMode::Text => render_report(report),
        DisplayMode::Summary => render_summary(&report.to_summary()),
        DisplayMode::Json => render_json(report)?,
    };
    println!("{}", rendered);
    Ok(())
}

pub fn render_json(report: &StackReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub fn render_report(report: &StackReport) -> String {
    let profile = &report.code_profile;
    let mut sections = Vec::new();

    sections.push(format!("{}", "═".repeat(72).bright_blue()));
    sections.push(format!("{}", "STACK PROFILE".bright_white().bold()));
    sections.push(format!("{}", "═".repeat(72).bright_blue()));

    let mut overview = BoxDrawer::new("Overview");
    overview.add_line("Path", &profile.path.display().to_string());
    overview.add_line("Files", &profile.total_files.to_string());
    overview.add_line("Lines", &profile.total_lines.to_string());
    if profile.error_files > 0 {
        overview.add_line("Unreadable files", &profile.error_files.to_string().red().to_string());
    }
    overview.add_line("Analyzed at", &report.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string());
    sections.push(overview.draw());

    let mut languages = BoxDrawer::new("Languages");
    if profile.language_infos.is_empty() {
        languages.add_text(&"No source files in known languages".dimmed().to_string());
    } else {
        languages.add_line("Language", "files / code / comment / blank");
        languages.add_separator();
        for info in &profile.language_infos {
            languages.add_line(
                &info.name,
                &format!(
                    "{} / {} / {} / {}",
                    info.files, info.code_lines, info.comment_lines, info.blank_lines
                ),
            );
        }
    }
    sections.push(languages.draw());

    let mut categories = BoxDrawer::new("Categories");
    for category in Category::ALL {
        let members = profile.languages_in(category);
        let value = if members.is_empty() {
            "-".dimmed().to_string()
        } else {
            members.join(", ")
        };
        categories.add_line(category_label(category), &value);
    }
    sections.push(categories.draw());

    sections.push(detection_box("Frameworks", &report.detection.frameworks));
    sections.push(detection_box("Components", &report.detection.components));

    sections.join("\n")
}

fn detection_box(title: &str, items: &[DetectedItem]) -> String {
    let mut drawer = BoxDrawer::new(title);
    if items.is_empty() {
        drawer.add_text(&"None detected".dimmed().to_string());
        return drawer.draw();
    }

    for category in Category::ALL {
        let in_category: Vec<&DetectedItem> = items
            .iter()
            .filter(|item| item.category == category)
            .collect();
        if in_category.is_empty() {
            continue;
        }
        drawer.add_text(&category_label(category).yellow().to_string());
        for item in in_category {
            let version = if item.version.is_empty() {
                String::new()
            } else {
                format!(" {}", item.version.green())
            };
            drawer.add_line(&format!("  {}", item.name), &format!("{}{}", item.language, version));
        }
    }
    drawer.draw()
}

fn category_label(category: Category) -> &'static str {
    match category {
        Category::Frontend => "Frontend",
        Category::Backend => "Backend",
        Category::Desktop => "Desktop",
        Category::Other => "Other",
    }
}

pub fn render_summary(summary: &StackSummary) -> String {
    let bar = format!("{}", "│".dimmed());
    let mut lines = vec![
        format!("{} {}", "▶".bright_blue(), "STACK SUMMARY".bright_white().bold()),
        "─".repeat(50).dimmed().to_string(),
        format!("{} Files: {}", bar, summary.total_files),
        format!("{} Languages: {}", bar, summary.languages.join(", ").blue()),
    ];

    if !summary.main_frontend_languages.is_empty() {
        lines.push(format!(
            "{} Main frontend: {}",
            bar,
            summary.main_frontend_languages.join(", ").cyan()
        ));
    }
    if !summary.main_backend_languages.is_empty() {
        lines.push(format!(
            "{} Main backend: {}",
            bar,
            summary.main_backend_languages.join(", ").cyan()
        ));
    }
    if !summary.frameworks.is_empty() {
        lines.push(format!("{} Frameworks: {}", bar, name_versions(&summary.frameworks).magenta()));
    }
    if !summary.components.is_empty() {
        lines.push(format!("{} Components: {}", bar, name_versions(&summary.components).magenta()));
    }

    lines.push("─".repeat(50).dimmed().to_string());
    lines.join("\n")
}

fn name_versions(items: &std::collections::BTreeMap<String, String>) -> String {
    items
        .iter()
        .map(|(name, version)| {
            if version.is_empty() {
                name.clone()
            } else {
                format!("{} {}", name, version)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Listing of detectable frameworks and components.
pub fn render_support(
    frameworks: Option<&[RuleMetadata]>,
    components: Option<&[RuleMetadata]>,
) -> String {
    let listings = [
        ("Supported frameworks", frameworks),
        ("Supported components", components),
    ];
    let mut sections = Vec::new();
    for (title, listing) in listings {
        let Some(listing) = listing else {
            continue;
        };
        let mut drawer = BoxDrawer::new(&format!("{} ({})", title, listing.len()));
        for meta in listing {
            drawer.add_line(&meta.name, &format!("{}: {}", meta.language, meta.rules.join(" | ")));
        }
        sections.push(drawer.draw());
    }
    sections.join("\n")
}

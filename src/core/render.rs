use crate::core::text::{escape_html, slugify};
use crate::domain::model::{Chapter, EmailTemplate, Product, ProductDetails};
use crate::utils::error::Result;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const BRAND: &str = "Generated by Whop Autopilot";
const PLR_NOTICE: &str = "This ebook comes with Private Label Rights (PLR).";
const PLR_USAGE: &str = "You may edit, rebrand, and resell this content.";

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFile {
    pub name: String,
    pub contents: Vec<u8>,
}

impl RenderedFile {
    fn text(name: impl Into<String>, contents: String) -> Self {
        Self {
            name: name.into(),
            contents: contents.into_bytes(),
        }
    }
}

/// 產生可供下載的檔案
pub fn render_product(product: &Product) -> Result<Vec<RenderedFile>> {
    let files = match &product.details {
        ProductDetails::Ebook {
            subtitle, chapters, ..
        } => vec![
            RenderedFile::text("ebook.html", ebook_html(&product.title, subtitle, chapters)),
            RenderedFile::text("ebook.txt", ebook_text(&product.title, subtitle, chapters)),
            RenderedFile::text("ebook.md", ebook_markdown(&product.title, subtitle, chapters)),
        ],
        ProductDetails::NotionTemplate {
            structure,
            instructions,
            ..
        } => vec![
            RenderedFile::text("notion_structure.json", serde_json::to_string_pretty(structure)?),
            RenderedFile::text(
                "setup_instructions.md",
                notion_instructions(&product.title, instructions),
            ),
        ],
        ProductDetails::DigitalPlanner {
            layouts, formats, ..
        } => vec![
            RenderedFile::text("planner_layouts.json", serde_json::to_string_pretty(layouts)?),
            RenderedFile::text(
                "planner_instructions.md",
                planner_instructions(&product.title, formats),
            ),
        ],
        ProductDetails::EmailTemplates { templates, .. } => templates
            .iter()
            .enumerate()
            .flat_map(|(i, template)| {
                let stem = format!("template_{}_{}", i + 1, slugify(&template.kind));
                [
                    RenderedFile::text(format!("{}.html", stem), email_html(template)),
                    RenderedFile::text(format!("{}.txt", stem), email_text(template)),
                ]
            })
            .collect(),
    };

    Ok(files)
}

pub fn ebook_html(title: &str, subtitle: &str, chapters: &[Chapter]) -> String {
    let title = escape_html(title);
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("    <meta charset=\"UTF-8\">\n");
    html.push_str("    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    html.push_str(&format!("    <title>{}</title>\n", title));
    html.push_str(
        "    <style>\n\
        body { font-family: Georgia, serif; line-height: 1.6; max-width: 800px; margin: 0 auto; padding: 20px; }\n\
        h1 { color: #333; border-bottom: 3px solid #007acc; padding-bottom: 10px; }\n\
        h2 { color: #555; margin-top: 30px; }\n\
        .subtitle { font-style: italic; color: #666; margin-bottom: 30px; }\n\
        .chapter { margin-bottom: 40px; page-break-after: always; }\n\
        .toc { background: #f9f9f9; padding: 20px; margin-bottom: 30px; }\n\
        .toc ul { list-style-type: none; }\n\
        .toc li { margin: 10px 0; }\n\
        .footer { text-align: center; margin-top: 50px; font-size: 0.9em; color: #666; }\n\
    </style>\n",
    );
    html.push_str("</head>\n<body>\n");
    html.push_str(&format!("    <h1>{}</h1>\n", title));
    if !subtitle.is_empty() {
        html.push_str(&format!("    <p class=\"subtitle\">{}</p>\n", escape_html(subtitle)));
    }

    html.push_str("    <div class=\"toc\">\n        <h2>Table of Contents</h2>\n        <ul>\n");
    for (i, chapter) in chapters.iter().enumerate() {
        html.push_str(&format!(
            "            <li>Chapter {}: {}</li>\n",
            i + 1,
            escape_html(&chapter.title)
        ));
    }
    html.push_str("        </ul>\n    </div>\n");

    for (i, chapter) in chapters.iter().enumerate() {
        html.push_str(&format!(
            "    <div class=\"chapter\"><h2>Chapter {}: {}</h2><div>{}</div></div>\n",
            i + 1,
            escape_html(&chapter.title),
            escape_html(&chapter.content).replace('\n', "<br>\n")
        ));
    }

    html.push_str("    <div class=\"footer\">\n");
    html.push_str(&format!("        <p>{} {}</p>\n", PLR_NOTICE, PLR_USAGE));
    html.push_str(&format!("        <p>{}</p>\n", BRAND));
    html.push_str("    </div>\n</body>\n</html>\n");
    html
}

pub fn ebook_text(title: &str, subtitle: &str, chapters: &[Chapter]) -> String {
    let mut text = format!("{}\n{}\n\n", title, "=".repeat(title.chars().count()));

    if !subtitle.is_empty() {
        text.push_str(&format!("{}\n\n", subtitle));
    }

    text.push_str("TABLE OF CONTENTS\n-----------------\n");
    for (i, chapter) in chapters.iter().enumerate() {
        text.push_str(&format!("Chapter {}: {}\n", i + 1, chapter.title));
    }
    text.push_str("\n\n");

    for (i, chapter) in chapters.iter().enumerate() {
        text.push_str(&format!("Chapter {}: {}\n", i + 1, chapter.title));
        text.push_str(&"-".repeat(chapter.title.chars().count() + 12));
        text.push_str("\n\n");
        text.push_str(&chapter.content);
        text.push_str("\n\n");
    }

    text.push('\n');
    text.push_str(&"=".repeat(50));
    text.push('\n');
    text.push_str(&format!("{}\n{}\n{}\n", PLR_NOTICE, PLR_USAGE, BRAND));
    text
}

pub fn ebook_markdown(title: &str, subtitle: &str, chapters: &[Chapter]) -> String {
    let mut md = format!("# {}\n\n", title);

    if !subtitle.is_empty() {
        md.push_str(&format!("*{}*\n\n", subtitle));
    }

    md.push_str("## Table of Contents\n\n");
    for (i, chapter) in chapters.iter().enumerate() {
        md.push_str(&format!("{}. {}\n", i + 1, chapter.title));
    }
    md.push_str("\n---\n\n");

    for (i, chapter) in chapters.iter().enumerate() {
        md.push_str(&format!("## Chapter {}: {}\n\n", i + 1, chapter.title));
        md.push_str(&chapter.content);
        md.push_str("\n\n");
    }

    md.push_str("---\n\n");
    md.push_str(&format!("**PLR License**: {} {}\n\n", PLR_NOTICE, PLR_USAGE));
    md.push_str(&format!("*{}*\n", BRAND));
    md
}

fn notion_instructions(name: &str, instructions: &[String]) -> String {
    let mut md = format!("# {} - Setup Instructions\n\n", name);
    for (i, instruction) in instructions.iter().enumerate() {
        md.push_str(&format!("{}. {}\n", i + 1, instruction));
    }
    md
}

fn planner_instructions(name: &str, formats: &[String]) -> String {
    let mut md = format!("# {}\n\n## How to Use This Planner\n\n", name);
    md.push_str("This digital planner can be used with:\n");
    for format in formats {
        md.push_str(&format!("- {}\n", format));
    }
    md
}

fn email_html(template: &EmailTemplate) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<title>{}</title>\n</head>\n<body>\n{}\n</body>\n</html>",
        escape_html(&template.subject_line),
        escape_html(&template.content).replace('\n', "<br>\n")
    )
}

fn email_text(template: &EmailTemplate) -> String {
    format!("Subject: {}\n\n{}", template.subject_line, template.content)
}

/// 將所有檔案打包成單一 ZIP，作為商品的下載附件
pub fn bundle_zip(files: &[RenderedFile]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    for file in files {
        zip.start_file::<_, ()>(file.name.as_str(), FileOptions::default())?;
        zip.write_all(&file.contents)?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

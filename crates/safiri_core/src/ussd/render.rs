//! Screen formatting.
//!
//! A screen is an optional error banner, any number of text sections, and an
//! optional navigation footer. Sections are separated by one blank line.

use super::UssdReply;

pub const FOOTER_BACK: &str = "0. Rudi Nyuma";
pub const FOOTER_EXIT: &str = "0. Toka";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Screen {
    banner: Option<String>,
    sections: Vec<Vec<String>>,
    footer: Option<&'static str>,
}

impl Screen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn banner(mut self, banner: Option<&str>) -> Self {
        self.banner = banner.map(str::to_string);
        self
    }

    /// A block of lines printed without blank lines between them.
    pub fn section<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sections.push(lines.into_iter().map(Into::into).collect());
        self
    }

    pub fn line(self, line: impl Into<String>) -> Self {
        self.section([line.into()])
    }

    /// Options numbered from 1 in the given order.
    pub fn numbered<I, S>(self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let lines: Vec<String> = labels
            .into_iter()
            .enumerate()
            .map(|(i, label)| format!("{}. {}", i + 1, label.as_ref()))
            .collect();
        self.section(lines)
    }

    pub fn footer(mut self, footer: &'static str) -> Self {
        self.footer = Some(footer);
        self
    }

    pub fn render(&self) -> String {
        let mut blocks: Vec<String> = Vec::with_capacity(self.sections.len() + 2);
        if let Some(banner) = &self.banner {
            blocks.push(banner.clone());
        }
        blocks.extend(
            self.sections
                .iter()
                .filter(|lines| !lines.is_empty())
                .map(|lines| lines.join("\n")),
        );
        if let Some(footer) = self.footer {
            blocks.push(footer.to_string());
        }
        blocks.join("\n\n")
    }

    pub fn proceed(self) -> UssdReply {
        UssdReply::Continue(self.render())
    }

    pub fn end(self) -> UssdReply {
        UssdReply::End(self.render())
    }
}

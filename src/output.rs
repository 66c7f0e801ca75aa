use anyhow::Result;
use console::{Term, style};
use jiff::Timestamp;
use serde::Serialize;

use crate::commands::username::UsernameResult;
use crate::models::Comment;
use crate::refresh::CommentView;
use crate::relative_time::{self, Locale};
use crate::sanitize::{escape_html, sanitize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Plain,
    Json,
    Html,
}

pub struct Output {
    term: Term,
    format: Format,
    locale: Locale,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self::with_format(if json { Format::Json } else { Format::Plain })
    }

    pub fn with_format(format: Format) -> Self {
        Self {
            term: Term::stdout(),
            format,
            locale: Locale::default(),
        }
    }

    pub fn locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let output = serde_json::to_string_pretty(value)?;
        self.term.write_line(&output)?;
        Ok(())
    }

    fn wrap_width(&self) -> usize {
        usize::from(self.term.size().1).clamp(20, 100)
    }

    pub fn comment_posted(&self, comment: &Comment, index: usize) -> Result<()> {
        if self.format == Format::Json {
            return self.print_json(comment);
        }

        self.term.write_line(&format!(
            "{} {} {}",
            style("Posted comment").green(),
            style(format!("#{index}")).cyan().bold(),
            style(comment.username()).bold()
        ))?;
        Ok(())
    }

    pub fn comment_list(&self, comments: &[Comment]) -> Result<()> {
        let now = Timestamp::now();
        match self.format {
            Format::Json => self.print_json(comments),
            Format::Html => {
                for comment in comments {
                    let label = relative_time::format(comment.created_time(), now, self.locale);
                    self.term.write_line(&render_html(comment, &label))?;
                }
                Ok(())
            }
            Format::Plain => {
                if comments.is_empty() {
                    self.term.write_line("No comments yet.")?;
                    return Ok(());
                }

                for (index, comment) in comments.iter().enumerate() {
                    let label = relative_time::format(comment.created_time(), now, self.locale);
                    self.print_comment(index, comment, &label)?;
                }
                Ok(())
            }
        }
    }

    fn print_comment(&self, index: usize, comment: &Comment, label: &str) -> Result<()> {
        self.term.write_line(&format!(
            "{} {} {}",
            style(format!("#{index}")).cyan().bold(),
            style(comment.username()).bold(),
            style(format!("({label})")).dim()
        ))?;

        let options = textwrap::Options::new(self.wrap_width())
            .initial_indent("  ")
            .subsequent_indent("  ");
        self.term
            .write_line(&textwrap::fill(comment.content(), options))?;
        self.term.write_line("")?;
        Ok(())
    }

    pub fn comment_deleted(&self, index: usize, comment: &Comment) -> Result<()> {
        self.term.write_line(&format!(
            "{} {} {}",
            style("Deleted comment").red(),
            style(format!("#{index}")).cyan().bold(),
            style(comment.username()).bold()
        ))?;
        Ok(())
    }

    pub fn username(&self, result: &UsernameResult) -> Result<()> {
        match (&result.username, result.changed) {
            (None, _) => self
                .term
                .write_line(&style("No username remembered yet.").dim().to_string())?,
            (Some(name), true) => self.term.write_line(&format!(
                "{} {}",
                style("Username set:").green(),
                style(name).bold()
            ))?,
            (Some(name), false) => self.term.write_line(name)?,
        }
        Ok(())
    }

    /// Redraw the whole list from live views.
    pub fn watch_frame(&self, views: &[CommentView]) -> Result<()> {
        if self.term.is_term() {
            self.term.clear_screen()?;
        }

        if views.is_empty() {
            self.term.write_line("No comments yet.")?;
        }
        for view in views {
            self.print_comment(view.index(), view.comment(), &view.label())?;
        }
        self.term.flush()?;
        Ok(())
    }
}

/// One comment as an HTML fragment. Username and content are escaped;
/// content code spans become `<code>`.
pub fn render_html(comment: &Comment, label: &str) -> String {
    format!(
        "<div class=\"comment\">\n  <div class=\"comment-user\"><span class=\"comment-username\">{}</span>:</div>\n  <pre>{}</pre>\n  <span class=\"comment-createdtime\">{}</span>\n</div>",
        escape_html(comment.username()),
        sanitize(comment.content()),
        escape_html(label)
    )
}

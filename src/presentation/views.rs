use std::io::Write;
use std::str::FromStr;
use std::sync::Mutex;

use askama::Template;

use crate::application::render::{RenderError, RenderSink};
use crate::cache::lock::mutex_lock;
use crate::domain::menu::{MenuEntry, MenuTree};

const SOURCE: &str = "presentation::views";

/// Templates a menu can be rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MenuTemplate {
    /// Nested `<ul>` navigation mirroring the tree.
    #[default]
    Nested,
    /// Flat ordered list with depth classes.
    Sitemap,
}

impl MenuTemplate {
    pub fn name(&self) -> &'static str {
        match self {
            MenuTemplate::Nested => "nested",
            MenuTemplate::Sitemap => "sitemap",
        }
    }
}

impl FromStr for MenuTemplate {
    type Err = RenderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "nested" => Ok(MenuTemplate::Nested),
            "sitemap" => Ok(MenuTemplate::Sitemap),
            other => Err(RenderError::UnknownTemplate(other.to_string())),
        }
    }
}

#[derive(Clone, Copy)]
pub enum LinkTarget {
    Self_,
    Blank,
}

impl LinkTarget {
    fn from_attribute(target: Option<&str>) -> Option<Self> {
        match target.map(str::trim) {
            Some("_blank") => Some(LinkTarget::Blank),
            Some("_self") => Some(LinkTarget::Self_),
            _ => None,
        }
    }

    pub fn as_html_target(&self) -> &'static str {
        match self {
            LinkTarget::Self_ => "_self",
            LinkTarget::Blank => "_blank",
        }
    }

    pub fn rel_attribute(&self) -> Option<&'static str> {
        match self {
            LinkTarget::Self_ => None,
            LinkTarget::Blank => Some("noopener noreferrer"),
        }
    }
}

#[derive(Clone)]
pub struct MenuLinkView {
    pub label: String,
    pub href: String,
    pub target: Option<&'static str>,
    pub rel: Option<&'static str>,
    pub classes: String,
    pub depth: usize,
    pub children_html: Option<String>,
}

impl MenuLinkView {
    fn from_entry(entry: &MenuEntry, depth: usize) -> Self {
        let target = LinkTarget::from_attribute(entry.target.as_deref());
        let href = if entry.url.trim().is_empty() {
            "#".to_string()
        } else {
            entry.url.clone()
        };

        Self {
            label: entry.title.clone(),
            href,
            target: target.map(|target| target.as_html_target()),
            rel: target.and_then(|target| target.rel_attribute()),
            classes: entry.classes.join(" "),
            depth,
            children_html: None,
        }
    }
}

#[derive(Template)]
#[template(path = "menu/nested.html")]
struct NestedMenuTemplate<'a> {
    items: &'a [MenuLinkView],
    depth: usize,
}

#[derive(Template)]
#[template(path = "menu/sitemap.html")]
struct SitemapTemplate {
    items: Vec<MenuLinkView>,
}

fn render_template<T: Template>(template: MenuTemplate, view: &T) -> Result<String, RenderError> {
    view.render()
        .map_err(|err| RenderError::template(template.name(), err))
}

fn render_nested_level(entries: &[MenuEntry], depth: usize) -> Result<String, RenderError> {
    let mut items = Vec::with_capacity(entries.len());
    for entry in entries {
        let mut view = MenuLinkView::from_entry(entry, depth);
        if !entry.children.is_empty() {
            view.children_html = Some(render_nested_level(&entry.children, depth + 1)?);
        }
        items.push(view);
    }

    render_template(
        MenuTemplate::Nested,
        &NestedMenuTemplate {
            items: &items,
            depth,
        },
    )
}

/// Render `tree` to an HTML fragment.
pub fn render_menu(template: MenuTemplate, tree: &MenuTree) -> Result<String, RenderError> {
    match template {
        MenuTemplate::Nested => render_nested_level(tree.roots(), 0),
        MenuTemplate::Sitemap => {
            let items = tree
                .walk()
                .map(|(depth, entry)| MenuLinkView::from_entry(entry, depth))
                .collect();
            render_template(MenuTemplate::Sitemap, &SitemapTemplate { items })
        }
    }
}

/// Render sink writing HTML fragments to a writer, one per call.
pub struct HtmlMenuRenderer<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> HtmlMenuRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> RenderSink for HtmlMenuRenderer<W> {
    fn render(&self, template: &str, tree: &MenuTree) -> Result<(), RenderError> {
        let template = template.parse::<MenuTemplate>()?;
        let html = render_menu(template, tree)?;

        let mut out = mutex_lock(&self.out, SOURCE, "render");
        out.write_all(html.as_bytes())?;
        out.write_all(b"\n")?;
        out.flush()?;
        Ok(())
    }
}

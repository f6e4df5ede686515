use at_core::{Error, Result};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Fields of one teaser block on the overview page, as found in the markup.
/// Nothing here is validated yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeaserFields {
    pub topline: Option<String>,
    pub headline: Option<String>,
    pub short_text: Option<String>,
    /// Absolute link to the detail page
    pub link: Option<String>,
    pub label: Option<String>,
}

/// Fields of one article detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailFields {
    pub topline: Option<String>,
    pub headline: Option<String>,
    /// Raw "Stand: dd.mm.yyyy hh:mm Uhr" line
    pub date_line: Option<String>,
    pub paragraphs: Vec<String>,
}

pub trait ArticleExtractor: Send + Sync {
    /// Teasers in page order; relative links are resolved against `base_url`
    fn extract_teasers(&self, markup: &str, base_url: &str) -> Result<Vec<TeaserFields>>;

    fn extract_detail(&self, markup: &str) -> Result<DetailFields>;
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Parse(format!("Invalid selector {}: {}", css, e)))
}

/// Text content with runs of whitespace collapsed; `None` when empty.
fn element_text(element: ElementRef<'_>) -> Option<String> {
    let text = element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope.select(selector).next().and_then(element_text)
}

/// Selector set for tagesschau.de markup.
#[derive(Debug, Clone)]
pub struct TagesschauExtractor {
    teaser_group: Selector,
    teaser_topline: Selector,
    teaser_headline: Selector,
    teaser_short_text: Selector,
    teaser_link: Selector,
    teaser_label: Selector,
    anchor: Selector,
    detail_date: Selector,
    detail_paragraph: Selector,
    detail_topline: Selector,
    detail_headline: Selector,
}

impl TagesschauExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            teaser_group: selector(r#"[class="columns twelve teasergroup"]"#)?,
            teaser_topline: selector(".teaser__topline")?,
            teaser_headline: selector(".teaser__headline")?,
            teaser_short_text: selector(".teaser__shorttext")?,
            teaser_link: selector(".teaser__link")?,
            teaser_label: selector(".teaser__label")?,
            anchor: selector("a[href]")?,
            detail_date: selector(".metatextline, .multimediahead__date")?,
            detail_paragraph: selector("p.textabsatz")?,
            detail_topline: selector(".seitenkopf__topline")?,
            detail_headline: selector(".seitenkopf__headline--text")?,
        })
    }

    fn resolve_link(&self, teaser: ElementRef<'_>, base: &Url) -> Option<String> {
        let link = teaser.select(&self.teaser_link).next()?;
        let href = link.value().attr("href").or_else(|| {
            link.select(&self.anchor)
                .next()
                .and_then(|a| a.value().attr("href"))
        })?;
        base.join(href.trim()).ok().map(String::from)
    }
}

impl ArticleExtractor for TagesschauExtractor {
    fn extract_teasers(&self, markup: &str, base_url: &str) -> Result<Vec<TeaserFields>> {
        let base = Url::parse(base_url)
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", base_url, e)))?;
        let document = Html::parse_document(markup);

        Ok(document
            .select(&self.teaser_group)
            .map(|teaser| TeaserFields {
                topline: first_text(teaser, &self.teaser_topline),
                headline: first_text(teaser, &self.teaser_headline),
                short_text: first_text(teaser, &self.teaser_short_text),
                link: self.resolve_link(teaser, &base),
                label: first_text(teaser, &self.teaser_label),
            })
            .collect())
    }

    fn extract_detail(&self, markup: &str) -> Result<DetailFields> {
        let document = Html::parse_document(markup);
        let root = document.root_element();

        Ok(DetailFields {
            topline: first_text(root, &self.detail_topline),
            headline: first_text(root, &self.detail_headline),
            date_line: first_text(root, &self.detail_date),
            paragraphs: root
                .select(&self.detail_paragraph)
                .filter_map(element_text)
                .collect(),
        })
    }
}

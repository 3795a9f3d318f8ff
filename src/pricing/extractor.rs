// src/pricing/extractor.rs

//! Turns arbitrary pricing-page markup into `{tier, price}` pairs.
//!
//! No single selector works across sites, so extraction is a cascade of
//! independent strategies evaluated in order. The first strategy that finds
//! at least two distinct tiers wins. The last one (a whole-page regex scan)
//! is also allowed to return a single tier.

use crate::pricing::models::{PricingTier, Snapshot};
use crate::pricing::patterns::{
    contains_keyword, display_name, find_price, find_tier, parse_price, FORWARD_PATTERNS,
    REVERSE_PATTERNS, TIER_KEYWORDS,
};
use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::debug;

/// Fewest distinct tiers for a structured strategy to count as a hit.
pub const MIN_TIERS: usize = 2;

/// Cards bigger than this are containers, not cards.
const CARD_TEXT_CEILING: usize = 1000;
/// Blocks bigger than this are containers for the structured-text scan.
const BLOCK_TEXT_CEILING: usize = 500;
const GRID_CHILDREN: std::ops::RangeInclusive<usize> = 2..=6;

const CARD_SELECTORS: [&str; 14] = [
    r#"[class*="pricing"]"#,
    r#"[class*="plan"]"#,
    r#"[class*="tier"]"#,
    r#"[class*="package"]"#,
    r#"[class*="subscription"]"#,
    r#"[class*="price-card"]"#,
    r#"[class*="priceCard"]"#,
    "[data-pricing]",
    "[data-plan]",
    "[data-tier]",
    ".card",
    ".pricing-table > *",
    ".plans > *",
    ".tiers > *",
];

const CONTAINER_SELECTORS: [&str; 8] = [
    "main",
    "section",
    r#"[class*="container"]"#,
    r#"[class*="wrapper"]"#,
    r#"[class*="grid"]"#,
    r#"[class*="flex"]"#,
    r#"[class*="row"]"#,
    r#"[class*="cards"]"#,
];

/// Never part of the visible text.
const SKIPPED_ELEMENTS: [&str; 5] = ["script", "style", "noscript", "template", "title"];

/// Rendered on their own line, so their text must not fuse with neighbours.
const BLOCK_ELEMENTS: [&str; 24] = [
    "address", "article", "aside", "br", "dd", "div", "dl", "dt", "footer", "h1", "h2", "h3",
    "h4", "h5", "h6", "header", "li", "main", "nav", "ol", "p", "section", "td", "ul",
];

lazy_static! {
    static ref CARDS: Vec<(&'static str, Selector)> = compile_all(&CARD_SELECTORS);
    static ref CONTAINERS: Vec<(&'static str, Selector)> = compile_all(&CONTAINER_SELECTORS);
    static ref HEADINGS: Selector = compile(
        r#"h1, h2, h3, h4, h5, h6, [class*="title"], [class*="name"], [class*="heading"]"#
    );
    static ref PRICE_HINTS: Selector =
        compile(r#"[class*="price"], [class*="amount"], [class*="cost"]"#);
    static ref BLOCKS: Selector = compile("div, section, article, li");
    static ref ANY_ELEMENT: Selector = compile("*");
    static ref BODY: Selector = compile("body");
}

fn compile(pattern: &str) -> Selector {
    Selector::parse(pattern).unwrap()
}

fn compile_all(patterns: &[&'static str]) -> Vec<(&'static str, Selector)> {
    patterns.iter().map(|p| (*p, compile(p))).collect()
}

/// Uniform signature shared by every extraction heuristic.
pub type Strategy = fn(&Html) -> Vec<PricingTier>;

/// Evaluated left to right; append new heuristics at the end.
pub const STRATEGIES: [(&str, Strategy); 5] = [
    ("pricing cards", card_selector_scan as Strategy),
    ("grid containers", grid_container_scan as Strategy),
    ("sibling keywords", sibling_keyword_scan as Strategy),
    ("structured text", structured_text_scan as Strategy),
    ("page text", page_text_scan as Strategy),
];

/// Extracts a snapshot from raw markup. Never fails: no pricing means an empty snapshot.
pub fn extract(html: &str) -> Snapshot {
    if html.trim().is_empty() {
        return Snapshot::empty();
    }

    let document = Html::parse_document(html);
    let last = STRATEGIES.len() - 1;

    for (idx, (name, strategy)) in STRATEGIES.iter().enumerate() {
        let tiers = dedupe(strategy(&document));
        let accepted = tiers.len() >= MIN_TIERS || (idx == last && !tiers.is_empty());

        if accepted {
            let snapshot = finalize(tiers);
            debug!(
                strategy = *name,
                tiers = snapshot.len(),
                pricing = %snapshot.summary(),
                "pricing extracted"
            );
            return snapshot;
        }
    }

    debug!("all strategies exhausted, no pricing found");
    Snapshot::empty()
}

/// Strategy 1: elements whose class or data attributes say "pricing card".
/// The first pattern matching at least two elements that also yields two tiers is used.
pub fn card_selector_scan(document: &Html) -> Vec<PricingTier> {
    for (pattern, selector) in CARDS.iter() {
        let cards: Vec<ElementRef<'_>> = document.select(selector).collect();
        if cards.len() < MIN_TIERS {
            continue;
        }

        let tiers = dedupe(cards.into_iter().filter_map(extract_from_element).collect());
        if tiers.len() >= MIN_TIERS {
            debug!(pattern = *pattern, "card pattern matched");
            return tiers;
        }
    }

    Vec::new()
}

/// Strategy 2: layout containers with a handful of direct children, one card each.
pub fn grid_container_scan(document: &Html) -> Vec<PricingTier> {
    for (pattern, selector) in CONTAINERS.iter() {
        for container in document.select(selector) {
            let children: Vec<ElementRef<'_>> =
                container.children().filter_map(ElementRef::wrap).collect();

            if !GRID_CHILDREN.contains(&children.len()) {
                continue;
            }

            let tiers = dedupe(children.into_iter().filter_map(extract_from_element).collect());
            if tiers.len() >= MIN_TIERS {
                debug!(pattern = *pattern, "grid container matched");
                return tiers;
            }
        }
    }

    Vec::new()
}

/// Strategy 3: an element naming a tier whose parent mentions a price.
pub fn sibling_keyword_scan(document: &Html) -> Vec<PricingTier> {
    let mut found = Vec::new();

    for keyword in TIER_KEYWORDS {
        let hit = document
            .select(&ANY_ELEMENT)
            .filter(|el| !is_skipped(*el))
            .filter(|el| contains_keyword(&own_text(*el), keyword))
            .find_map(|el| {
                let parent = el.parent().and_then(ElementRef::wrap)?;
                find_price(&visible_text(parent))
            });

        if let Some(price) = hit {
            found.push(PricingTier::new(display_name(keyword), price));
        }
    }

    dedupe(found)
}

/// Strategy 4: small blocks mentioning both a tier keyword and a price.
pub fn structured_text_scan(document: &Html) -> Vec<PricingTier> {
    let mut found = Vec::new();

    for block in document.select(&BLOCKS) {
        let text = visible_text(block);
        if text.chars().count() > BLOCK_TEXT_CEILING {
            continue;
        }

        if let (Some(tier), Some(price)) = (find_tier(&text), find_price(&text)) {
            found.push(PricingTier::new(tier, price));
        }
    }

    dedupe(found)
}

/// Strategy 5: regex over the whole visible page text.
/// `Tier ... $Price` first; `$Price ... Tier` only fills in what is still missing.
pub fn page_text_scan(document: &Html) -> Vec<PricingTier> {
    let body = document
        .select(&BODY)
        .next()
        .unwrap_or_else(|| document.root_element());
    let text = visible_text(body);

    let mut found: Vec<PricingTier> = Vec::new();

    for (keyword, pattern) in FORWARD_PATTERNS.iter() {
        if let Some(price) = first_capture_price(pattern, &text) {
            found.push(PricingTier::new(display_name(keyword), price));
        }
    }

    if found.len() < MIN_TIERS {
        for (keyword, pattern) in REVERSE_PATTERNS.iter() {
            if found.iter().any(|t| t.tier.eq_ignore_ascii_case(keyword)) {
                continue;
            }
            if let Some(price) = first_capture_price(pattern, &text) {
                found.push(PricingTier::new(display_name(keyword), price));
            }
        }
    }

    found
}

fn first_capture_price(pattern: &regex::Regex, text: &str) -> Option<f64> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_price(m.as_str()))
}

/// Reads one candidate card: tier from a heading if possible, price from a
/// price-like descendant if possible, each falling back to the whole card text.
pub fn extract_from_element(element: ElementRef<'_>) -> Option<PricingTier> {
    let full_text = visible_text(element);
    if full_text.chars().count() > CARD_TEXT_CEILING {
        return None;
    }

    let tier = element
        .select(&HEADINGS)
        .next()
        .and_then(|heading| find_tier(&visible_text(heading)))
        .or_else(|| find_tier(&full_text))?;

    let price = element
        .select(&PRICE_HINTS)
        .next()
        .and_then(|hint| find_price(&visible_text(hint)))
        .or_else(|| find_price(&full_text))?;

    Some(PricingTier::new(tier, price))
}

/// First occurrence of each tier name wins, compared case-insensitively.
pub fn dedupe(tiers: Vec<PricingTier>) -> Vec<PricingTier> {
    let mut seen = HashSet::new();
    tiers
        .into_iter()
        .filter(|t| seen.insert(t.tier.to_lowercase()))
        .collect()
}

fn finalize(mut tiers: Vec<PricingTier>) -> Snapshot {
    tiers.sort_by(|a, b| a.price.total_cmp(&b.price));
    Snapshot::new(tiers, Default::default())
}

/// Text a reader would see, whitespace collapsed.
pub fn visible_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(element, &mut raw);
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_el) = ElementRef::wrap(child) {
            if is_skipped(child_el) {
                continue;
            }
            let block = BLOCK_ELEMENTS.contains(&child_el.value().name());
            if block {
                out.push(' ');
            }
            collect_text(child_el, out);
            if block {
                out.push(' ');
            }
        }
    }
}

/// Text nodes directly under `element`, ignoring its children.
fn own_text(element: ElementRef<'_>) -> String {
    element
        .children()
        .filter_map(|child| child.value().as_text())
        .map(|text| &**text)
        .collect::<String>()
        .trim()
        .to_lowercase()
}

fn is_skipped(element: ElementRef<'_>) -> bool {
    SKIPPED_ELEMENTS.contains(&element.value().name())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiers(snapshot: &Snapshot) -> Vec<(String, f64)> {
        snapshot
            .pricing
            .iter()
            .map(|p| (p.tier.clone(), p.price))
            .collect()
    }

    const CARD_PAGE: &str = r#"
        <html><body>
          <div class="pricing-grid">
            <div class="pricing-card"><h3>Enterprise</h3><span class="price">$249</span><p>For large orgs</p></div>
            <div class="pricing-card"><h3>Starter</h3><span class="price">$29</span><p>For individuals</p></div>
            <div class="pricing-card"><h3>Pro</h3><span class="price">$79</span><p>Most popular</p></div>
          </div>
        </body></html>
    "#;

    #[test]
    fn card_scan_reads_every_card() {
        let doc = Html::parse_document(CARD_PAGE);
        let found = card_selector_scan(&doc);
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn output_is_sorted_by_price_regardless_of_document_order() {
        let snap = extract(CARD_PAGE);
        assert_eq!(
            tiers(&snap),
            vec![
                ("Starter".to_string(), 29.0),
                ("Pro".to_string(), 79.0),
                ("Enterprise".to_string(), 249.0),
            ]
        );
    }

    #[test]
    fn duplicate_tier_names_keep_first_occurrence() {
        let html = r#"
            <body>
              <div class="plan"><h3>Pro</h3><span class="price">$49</span></div>
              <div class="plan"><h3>PRO</h3><span class="price">$99</span></div>
              <div class="plan"><h3>Basic</h3><span class="price">$9</span></div>
            </body>
        "#;
        let snap = extract(html);
        let pros: Vec<_> = snap
            .pricing
            .iter()
            .filter(|p| p.tier.eq_ignore_ascii_case("pro"))
            .collect();

        assert_eq!(pros.len(), 1);
        assert_eq!(pros[0].price, 49.0);
        assert_eq!(tiers(&snap)[0], ("Basic".to_string(), 9.0));
    }

    #[test]
    fn grid_scan_handles_unclassed_layouts() {
        let html = r#"
            <body><section>
              <article><h2>Basic</h2><p>$9 per month</p></article>
              <article><h2>Premium</h2><p>$1,249.50 per month</p></article>
            </section></body>
        "#;
        let doc = Html::parse_document(html);
        assert!(card_selector_scan(&doc).is_empty());

        let snap = extract(html);
        assert_eq!(
            tiers(&snap),
            vec![("Basic".to_string(), 9.0), ("Premium".to_string(), 1249.5)]
        );
    }

    #[test]
    fn grid_scan_ignores_containers_with_too_many_children() {
        let items: String = (0..8)
            .map(|i| format!("<div><h4>Pro</h4><p>${}</p></div>", 10 + i))
            .collect();
        let doc = Html::parse_document(&format!("<body><main>{items}</main></body>"));
        assert!(grid_container_scan(&doc).is_empty());
    }

    #[test]
    fn sibling_scan_reads_price_from_parent() {
        let html = r#"
            <body>
              <div><span>Starter</span> <b>$19</b></div>
              <div><span>Team</span> <b>$59</b></div>
            </body>
        "#;
        let doc = Html::parse_document(html);
        let found = sibling_keyword_scan(&doc);
        assert_eq!(
            found,
            vec![PricingTier::new("Starter", 19.0), PricingTier::new("Team", 59.0)]
        );
    }

    #[test]
    fn structured_text_scan_matches_small_blocks() {
        let html = r#"<body><ul><li>Growth plan - $120/mo</li><li>Plus plan - $60/mo</li></ul></body>"#;
        let doc = Html::parse_document(html);
        let found = structured_text_scan(&doc);
        assert_eq!(
            found,
            vec![PricingTier::new("Growth", 120.0), PricingTier::new("Plus", 60.0)]
        );
    }

    #[test]
    fn page_text_scan_accepts_a_single_tier() {
        let html = "<body><p>Our Pro subscription costs just $15 a month.</p></body>";
        let snap = extract(html);
        assert_eq!(tiers(&snap), vec![("Pro".to_string(), 15.0)]);
    }

    #[test]
    fn page_text_scan_falls_back_to_reverse_patterns() {
        let html = "<body><p>$39 - Starter</p></body>";
        let doc = Html::parse_document(html);
        assert_eq!(page_text_scan(&doc), vec![PricingTier::new("Starter", 39.0)]);
    }

    #[test]
    fn oversized_elements_are_not_cards() {
        let filler = "lorem ipsum ".repeat(100);
        let html = format!(
            r#"<body><div class="card"><h3>Pro</h3><span class="price">$10</span><p>{filler}</p></div></body>"#
        );
        let doc = Html::parse_document(&html);
        let card = doc.select(&compile(".card")).next().unwrap();
        assert!(extract_from_element(card).is_none());
    }

    #[test]
    fn price_hint_without_currency_falls_back_to_card_text() {
        let html = r#"<body><div class="card"><h3>Team</h3><span class="price">Contact us</span><p>$45 per seat</p></div></body>"#;
        let doc = Html::parse_document(html);
        let card = doc.select(&compile(".card")).next().unwrap();
        assert_eq!(
            extract_from_element(card),
            Some(PricingTier::new("Team", 45.0))
        );
    }

    #[test]
    fn script_contents_are_not_visible_text() {
        let html = r#"<body><script>var plans = "Pro $5 Starter $3";</script><p>Hello</p></body>"#;
        assert!(extract(html).is_empty());
    }

    #[test]
    fn page_without_pricing_yields_empty_snapshot() {
        let html = "<html><body><h1>About us</h1><p>We build things.</p></body></html>";
        assert!(extract(html).is_empty());
        assert!(extract("").is_empty());
    }

    #[test]
    fn split_cents_markup_keeps_its_cents() {
        let html = r#"<body><p>Pro <span>$79</span><span>.99</span></p></body>"#;
        assert_eq!(tiers(&extract(html)), vec![("Pro".to_string(), 79.99)]);
    }
}

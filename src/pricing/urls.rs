// src/pricing/urls.rs

use url::Url;

/// Path fragments that mark a page as a pricing page.
pub const PRICING_PATH_PATTERNS: [&str; 5] =
    ["/pricing", "/plans", "/price", "/packages", "/subscriptions"];

pub fn is_pricing_page(url: &str) -> bool {
    Url::parse(url)
        .map(|u| {
            let path = u.path().to_lowercase();
            PRICING_PATH_PATTERNS.iter().any(|p| path.contains(p))
        })
        .unwrap_or(false)
}

/// Best guess at the pricing page for a site: the URL itself if it already
/// looks like one, otherwise `<origin>/pricing`.
pub fn pricing_page_url(base: &str) -> Option<String> {
    let url = Url::parse(base).ok()?;
    if is_pricing_page(base) {
        return Some(base.to_string());
    }
    let origin = url.origin();
    if !origin.is_tuple() {
        return None;
    }
    Some(format!("{}/pricing", origin.ascii_serialization()))
}

/// Why a URL is on the candidate list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    /// The configured URL already looks like a pricing page.
    ProvidedPricing,
    /// `<origin>/pricing` guessed from the configured URL.
    DetectedPricing,
    Homepage,
}

impl CandidateKind {
    pub fn label(&self) -> &'static str {
        match self {
            CandidateKind::ProvidedPricing => "provided pricing URL",
            CandidateKind::DetectedPricing => "auto-detected pricing page",
            CandidateKind::Homepage => "homepage",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub url: String,
    pub kind: CandidateKind,
}

/// Ordered list of pages to fetch for a configured competitor URL.
pub fn candidate_urls(provided: &str) -> Vec<Candidate> {
    if is_pricing_page(provided) {
        return vec![Candidate {
            url: provided.to_string(),
            kind: CandidateKind::ProvidedPricing,
        }];
    }

    let mut candidates = Vec::new();
    if let Some(pricing) = pricing_page_url(provided).filter(|p| p != provided) {
        candidates.push(Candidate {
            url: pricing,
            kind: CandidateKind::DetectedPricing,
        });
    }
    candidates.push(Candidate {
        url: provided.to_string(),
        kind: CandidateKind::Homepage,
    });
    candidates
}

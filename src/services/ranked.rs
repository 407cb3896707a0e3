//! Ranked-list extraction from chart pages.
//!
//! Chart entries are links to item detail pages whose visible text starts
//! with the rank, e.g. `1 Some App Category View`.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::{DuplicateRank, RankedItem, RankedSnapshot, RankingPolicy};
use crate::services::markup::MarkupNode;

static RANK_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(.*)$").expect("valid regex"));

/// Extract the wanted ranks from a chart page.
///
/// Returns only the ranks actually found; the caller decides whether a
/// short snapshot is a failure.
pub fn extract_ranked<N: MarkupNode>(
    root: &N,
    wanted: &[u32],
    policy: &RankingPolicy,
) -> RankedSnapshot {
    let mut by_rank: BTreeMap<u32, String> = BTreeMap::new();

    for anchor in root.find_all(&["a"]) {
        let Some(href) = anchor.attr("href") else {
            continue;
        };
        if !is_detail_link(href, policy) {
            continue;
        }

        let text = anchor.text();
        let Some((rank, _)) = split_rank(&text) else {
            continue;
        };
        if !wanted.contains(&rank) {
            continue;
        }

        let Some(name) = resolve_name(&anchor, &text, policy) else {
            log::debug!("Rank {} link has no usable name: {:?}", rank, text);
            continue;
        };

        match policy.duplicate_rank {
            DuplicateRank::FirstSeen => {
                by_rank.entry(rank).or_insert(name);
            }
            DuplicateRank::LastSeen => {
                by_rank.insert(rank, name);
            }
        }
    }

    RankedSnapshot::from_items(
        by_rank
            .into_iter()
            .map(|(rank, name)| RankedItem::new(rank, name))
            .collect(),
    )
}

fn is_detail_link(href: &str, policy: &RankingPolicy) -> bool {
    href.contains(&policy.detail_path_segment) && href.contains(&policy.id_marker)
}

/// Split `"<rank> <rest>"`. Text must start with digits followed by whitespace.
fn split_rank(text: &str) -> Option<(u32, &str)> {
    let caps = RANK_PREFIX.captures(text)?;
    let rank = caps.get(1)?.as_str().parse().ok()?;
    Some((rank, caps.get(2).map_or("", |m| m.as_str())))
}

/// Prefer a nested heading; otherwise use the leading words after the rank.
fn resolve_name<N: MarkupNode>(anchor: &N, text: &str, policy: &RankingPolicy) -> Option<String> {
    if let Some(heading) = anchor.find_first(&["h3", "h2"]) {
        let name = heading.text();
        return (!name.is_empty()).then_some(name);
    }

    let text = strip_action_word(text, &policy.trailing_action_word);
    let (_, rest) = split_rank(text)?;
    let name = rest
        .split_whitespace()
        .take(policy.max_name_tokens)
        .collect::<Vec<_>>()
        .join(" ");
    (!name.is_empty()).then_some(name)
}

/// Remove a trailing action word (case-insensitive) preceded by whitespace.
fn strip_action_word<'t>(text: &'t str, word: &str) -> &'t str {
    let text = text.trim();
    if word.is_empty() {
        return text;
    }
    let Some(split) = text.len().checked_sub(word.len()) else {
        return text;
    };
    if !text.is_char_boundary(split) {
        return text;
    }
    let (head, tail) = text.split_at(split);
    if tail.eq_ignore_ascii_case(word) && head.ends_with(char::is_whitespace) {
        head.trim_end()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::markup::HtmlDocument;

    const CHART: &str = r#"
        <html><body>
          <nav><a href="/us/iphone/charts">1 Charts</a></nav>
          <ol>
            <li><a href="https://apps.apple.com/us/app/alpha/id111">
              1 <div><h3>Alpha Messenger</h3><p>Social Networking</p></div> View
            </a></li>
            <li><a href="https://apps.apple.com/us/app/beta/id222">
              2 Beta Maps Navigation and Traffic Updates Free Forever View
            </a></li>
            <li><a href="https://apps.apple.com/us/app/gamma/id333">
              3 <h2>Gamma</h2>
            </a></li>
            <li><a href="https://apps.apple.com/us/app/delta/id444">4 Delta</a></li>
          </ol>
        </body></html>
    "#;

    fn extract(html: &str, wanted: &[u32]) -> RankedSnapshot {
        let doc = HtmlDocument::parse(html);
        extract_ranked(&doc.root(), wanted, &RankingPolicy::default())
    }

    #[test]
    fn test_extracts_wanted_ranks_in_order() {
        let snapshot = extract(CHART, &[3, 1, 2]);
        assert_eq!(
            snapshot.items(),
            &[
                RankedItem::new(1, "Alpha Messenger"),
                RankedItem::new(2, "Beta Maps Navigation and Traffic Updates"),
                RankedItem::new(3, "Gamma"),
            ]
        );
    }

    #[test]
    fn test_ignores_non_detail_links() {
        let snapshot = extract(CHART, &[1]);
        assert_eq!(snapshot.items(), &[RankedItem::new(1, "Alpha Messenger")]);
    }

    #[test]
    fn test_partial_result() {
        let snapshot = extract(CHART, &[4, 5]);
        assert_eq!(snapshot.items(), &[RankedItem::new(4, "Delta")]);
    }

    #[test]
    fn test_first_seen_wins_on_duplicate_rank() {
        let html = r#"
            <a href="/us/app/one/id1">1 First Name View</a>
            <a href="/us/app/two/id2">1 Second Name View</a>
        "#;
        assert_eq!(extract(html, &[1]).items(), &[RankedItem::new(1, "First Name")]);

        let policy = RankingPolicy {
            duplicate_rank: DuplicateRank::LastSeen,
            ..RankingPolicy::default()
        };
        let doc = HtmlDocument::parse(html);
        let snapshot = extract_ranked(&doc.root(), &[1], &policy);
        assert_eq!(snapshot.items(), &[RankedItem::new(1, "Second Name")]);
    }

    #[test]
    fn test_rank_requires_trailing_whitespace() {
        let html = r#"
            <a href="/us/app/x/id1">1Password</a>
            <a href="/us/app/y/id2">#2 Hash</a>
        "#;
        assert!(extract(html, &[1, 2]).is_empty());
    }

    #[test]
    fn test_empty_heading_discards_candidate() {
        let html = r#"<a href="/us/app/x/id1">1 <h3> </h3> Fallback Name</a>"#;
        assert!(extract(html, &[1]).is_empty());
    }

    #[test]
    fn test_only_action_word_left_discards_candidate() {
        let html = r#"<a href="/us/app/x/id1">1 View</a>"#;
        assert!(extract(html, &[1]).is_empty());
    }

    #[test]
    fn test_unparsable_page_is_empty() {
        assert!(extract("<<<not html at all", &[1, 2, 3]).is_empty());
        assert!(extract("", &[1]).is_empty());
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let first = serde_json::to_string(&extract(CHART, &[1, 2, 3])).unwrap();
        let second = serde_json::to_string(&extract(CHART, &[1, 2, 3])).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_strip_action_word() {
        assert_eq!(strip_action_word("Alpha App view", "View"), "Alpha App");
        assert_eq!(strip_action_word("Preview", "View"), "Preview");
        assert_eq!(strip_action_word("Alpha", "View"), "Alpha");
    }
}

//! Picks the votes that are newer than the stored watermark.

use crate::schema::{VoteRecord, Watermark};

/// Whether a vote keyed `(parliament, number)` lies past the watermark.
///
/// Parliament numbers only grow, so a later parliament wins regardless of the
/// vote number inside it.
pub fn is_new(key: Watermark, watermark: Watermark) -> bool {
    key.parliament > watermark.parliament
        || (key.parliament == watermark.parliament && key.number > watermark.number)
}

/// Keeps the votes newer than `watermark`, in feed order (newest first).
///
/// With `limit` set only the first `limit` survivors are kept, which are the
/// most recent ones since the feed leads with the newest vote.
pub fn select_new(
    votes: Vec<VoteRecord>,
    watermark: Watermark,
    limit: Option<usize>,
) -> Vec<VoteRecord> {
    let fresh = votes
        .into_iter()
        .filter(|vote| is_new(vote.key(), watermark));

    match limit {
        Some(k) => fresh.take(k).collect(),
        None => fresh.collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vote(parliament: u32, number: u32) -> VoteRecord {
        VoteRecord {
            parliament,
            number,
            ..Default::default()
        }
    }

    fn keys(votes: &[VoteRecord]) -> Vec<(u32, u32)> {
        votes.iter().map(|v| (v.parliament, v.number)).collect()
    }

    #[test]
    fn boundary_around_watermark() {
        let mark = Watermark::new(42, 100);
        assert!(!is_new(Watermark::new(42, 99), mark));
        assert!(!is_new(Watermark::new(42, 100), mark));
        assert!(is_new(Watermark::new(42, 101), mark));
        assert!(is_new(Watermark::new(43, 1), mark));
        assert!(!is_new(Watermark::new(41, 999), mark));
    }

    #[test]
    fn rule_agrees_with_key_ordering() {
        let mark = Watermark::new(3, 5);
        for p in 0..6 {
            for n in 0..10 {
                let key = Watermark::new(p, n);
                assert_eq!(is_new(key, mark), key > mark, "key {key}");
            }
        }
    }

    #[test]
    fn keeps_feed_order() {
        let feed = vec![vote(43, 2), vote(43, 1), vote(42, 101), vote(42, 100), vote(42, 99)];
        let selected = select_new(feed, Watermark::new(42, 100), None);
        assert_eq!(keys(&selected), vec![(43, 2), (43, 1), (42, 101)]);
    }

    #[test]
    fn bootstrap_takes_everything() {
        let feed = vec![vote(41, 3), vote(41, 2), vote(41, 1)];
        let selected = select_new(feed, Watermark::default(), None);
        assert_eq!(selected.len(), 3);
    }

    #[test]
    fn nothing_new_is_empty() {
        let feed = vec![vote(42, 100), vote(42, 99)];
        assert!(select_new(feed, Watermark::new(42, 100), None).is_empty());
        assert!(select_new(Vec::new(), Watermark::new(42, 100), None).is_empty());
    }

    #[test]
    fn limit_keeps_most_recent() {
        let feed = vec![vote(41, 5), vote(41, 4), vote(41, 3), vote(41, 2)];
        let selected = select_new(feed, Watermark::new(41, 1), Some(2));
        assert_eq!(keys(&selected), vec![(41, 5), (41, 4)]);
    }
}

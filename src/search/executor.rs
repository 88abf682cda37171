//! Conjunctive matching and BM25 top-k selection over decoded posting lists

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;

use crate::index::{Bm25Scorer, DocNo, Posting};

/// Decoded posting list of one query term
#[derive(Clone, Debug)]
pub struct TermPostings {
    pub term: String,
    /// Document frequency, the lexicon posting count
    pub df: u32,
    pub postings: Vec<Posting>,
}

/// Documents present in every list, ascending
///
/// Lists are intersected shortest first so the candidate set shrinks as
/// early as possible.
pub fn intersect(lists: &[TermPostings]) -> Vec<DocNo> {
    let mut order: Vec<&TermPostings> = lists.iter().collect();
    order.sort_by_key(|l| l.postings.len());

    let Some((first, rest)) = order.split_first() else {
        return Vec::new();
    };

    let mut candidates: Vec<DocNo> = first.postings.iter().map(|p| p.docno).collect();
    for list in rest {
        if candidates.is_empty() {
            break;
        }
        candidates = intersect_sorted(&candidates, &list.postings);
    }
    candidates
}

fn intersect_sorted(candidates: &[DocNo], postings: &[Posting]) -> Vec<DocNo> {
    let mut out = Vec::with_capacity(candidates.len().min(postings.len()));
    let (mut i, mut j) = (0, 0);

    while i < candidates.len() && j < postings.len() {
        match candidates[i].cmp(&postings[j].docno) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                out.push(candidates[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

/// BM25 score of every candidate, in candidate order
///
/// `candidates` must be ascending and contained in every list; each list is
/// walked once with a forward cursor.
pub fn score_candidates(
    candidates: &[DocNo],
    lists: &[TermPostings],
    scorer: &Bm25Scorer,
    doc_lengths: &[u32],
) -> Vec<(DocNo, f64)> {
    let idfs: Vec<f64> = lists.iter().map(|l| scorer.idf(l.df)).collect();
    let mut cursors = vec![0usize; lists.len()];
    let mut scored = Vec::with_capacity(candidates.len());

    for &docno in candidates {
        let doc_len = doc_lengths.get(docno.as_usize()).copied().unwrap_or(0);
        let mut score = 0.0;

        for (t, list) in lists.iter().enumerate() {
            let postings = &list.postings;
            let cursor = &mut cursors[t];
            while *cursor < postings.len() && postings[*cursor].docno < docno {
                *cursor += 1;
            }
            if let Some(p) = postings.get(*cursor).filter(|p| p.docno == docno) {
                score += scorer.term_score(idfs[t], p.term_frequency, doc_len);
            }
        }

        scored.push((docno, score));
    }
    scored
}

/// Heap entry ordered by score, then by descending docno
///
/// The "smallest" entry is the one evicted first: the lowest score, and among
/// equal scores the highest docno.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ScoreEntry {
    score: OrderedFloat<f64>,
    docno: DocNo,
}

impl Ord for ScoreEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .cmp(&other.score)
            .then_with(|| other.docno.cmp(&self.docno))
    }
}

impl PartialOrd for ScoreEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Keep the `k` best `(docno, score)` pairs, best first
///
/// Equal scores rank the lower docno first.
pub fn collect_top_k<I>(scored: I, k: usize) -> Vec<(DocNo, f64)>
where
    I: IntoIterator<Item = (DocNo, f64)>,
{
    if k == 0 {
        return Vec::new();
    }

    let mut heap: BinaryHeap<Reverse<ScoreEntry>> = BinaryHeap::with_capacity(k.min(1024) + 1);
    for (docno, score) in scored {
        let entry = ScoreEntry {
            score: OrderedFloat(score),
            docno,
        };
        if heap.len() < k {
            heap.push(Reverse(entry));
        } else if let Some(Reverse(worst)) = heap.peek() {
            if entry > *worst {
                heap.pop();
                heap.push(Reverse(entry));
            }
        }
    }

    // Ascending Reverse order is descending entry order
    heap.into_sorted_vec()
        .into_iter()
        .map(|Reverse(e)| (e.docno, e.score.into_inner()))
        .collect()
}

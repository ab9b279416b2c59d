use crate::store::segment_meta::SegmentMeta;

/// Decides when and which on-disk segments the background maintainer
/// should compact together.
pub trait MergePolicy: Send + Sync {
    fn should_merge(&self, segments: &[SegmentMeta]) -> bool;

    fn select_segments_to_merge(&self, segments: &[SegmentMeta]) -> Vec<SegmentMeta>;
}

/// Merges small segments together once there are enough of them, similar
/// in spirit to Lucene's tiered merge policy.
pub struct TieredMergePolicy {
    pub max_segments_per_tier: usize,
    pub max_segment_size_bytes: usize,
    pub min_segments_to_merge: usize,
    pub max_segments_to_merge: usize,
}

impl Default for TieredMergePolicy {
    fn default() -> Self {
        TieredMergePolicy {
            max_segments_per_tier: 10,
            max_segment_size_bytes: 64 * 1024 * 1024,
            min_segments_to_merge: 2,
            max_segments_to_merge: 10,
        }
    }
}

impl MergePolicy for TieredMergePolicy {
    fn should_merge(&self, segments: &[SegmentMeta]) -> bool {
        if segments.len() > self.max_segments_per_tier {
            return true;
        }
        let small = segments.iter().filter(|s| s.size_bytes < 1024 * 1024).count();
        small >= self.min_segments_to_merge
    }

    fn select_segments_to_merge(&self, segments: &[SegmentMeta]) -> Vec<SegmentMeta> {
        let mut sorted = segments.to_vec();
        sorted.sort_by_key(|s| s.size_bytes);

        let mut selected = Vec::new();
        let mut current_size = 0;
        for segment in sorted {
            if segment.size_bytes > self.max_segment_size_bytes / 2 {
                continue;
            }
            if current_size + segment.size_bytes > self.max_segment_size_bytes {
                break;
            }
            current_size += segment.size_bytes;
            selected.push(segment);
            if selected.len() >= self.max_segments_to_merge {
                break;
            }
        }

        if selected.len() < self.min_segments_to_merge { Vec::new() } else { selected }
    }
}

/// Merges segments within the same rough size tier, favoring write-heavy
/// workloads that accumulate many small segments quickly.
pub struct LogStructuredMergePolicy {
    pub size_ratio: f64,
    pub min_merge_size_bytes: usize,
    pub tier_trigger: usize,
}

impl Default for LogStructuredMergePolicy {
    fn default() -> Self {
        LogStructuredMergePolicy { size_ratio: 10.0, min_merge_size_bytes: 64 * 1024, tier_trigger: 4 }
    }
}

impl LogStructuredMergePolicy {
    fn tier_of(&self, size_bytes: usize) -> usize {
        let ratio = (size_bytes.max(1) as f64 / self.min_merge_size_bytes.max(1) as f64).max(1.0);
        (ratio.log10() / self.size_ratio.log10()) as usize
    }

    fn tiers(&self, segments: &[SegmentMeta]) -> Vec<Vec<SegmentMeta>> {
        let mut tiers: Vec<Vec<SegmentMeta>> = Vec::new();
        for segment in segments {
            let tier = self.tier_of(segment.size_bytes);
            while tiers.len() <= tier {
                tiers.push(Vec::new());
            }
            tiers[tier].push(segment.clone());
        }
        tiers
    }
}

impl MergePolicy for LogStructuredMergePolicy {
    fn should_merge(&self, segments: &[SegmentMeta]) -> bool {
        self.tiers(segments).iter().any(|tier| tier.len() >= self.tier_trigger)
    }

    fn select_segments_to_merge(&self, segments: &[SegmentMeta]) -> Vec<SegmentMeta> {
        self.tiers(segments)
            .into_iter()
            .find(|tier| tier.len() >= self.tier_trigger)
            .unwrap_or_default()
    }
}

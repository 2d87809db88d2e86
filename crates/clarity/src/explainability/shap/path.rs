//! Decision-path bookkeeping for TreeSHAP.
//!
//! A path holds one element per split feature encountered from the root to
//! the current node. Each element tracks which fraction of the coalitions
//! that exclude the feature (`zero_fraction`) or include it (`one_fraction`)
//! flow down this path, and `pweight` holds the permutation weights of the
//! subsets of path features.

/// One element of the decision path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PathElement {
    /// Split feature, or -1 for the root sentinel.
    pub feature_index: i32,
    pub zero_fraction: f64,
    pub one_fraction: f64,
    pub pweight: f64,
}

/// Growable decision path with the TreeSHAP extend/unwind operations.
#[derive(Clone, Debug, Default)]
pub(crate) struct PathState {
    elements: Vec<PathElement>,
}

impl PathState {
    /// Empty path with room for `max_depth` splits plus the root sentinel.
    pub fn with_capacity(max_depth: usize) -> Self {
        Self {
            elements: Vec::with_capacity(max_depth + 2),
        }
    }

    /// Number of elements (including the root sentinel).
    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn element(&self, i: usize) -> &PathElement {
        &self.elements[i]
    }

    /// Position of `feature` on the path, skipping the root sentinel.
    pub fn find(&self, feature: i32) -> Option<usize> {
        self.elements
            .iter()
            .skip(1)
            .position(|e| e.feature_index == feature)
            .map(|i| i + 1)
    }

    /// Append a split and update permutation weights.
    pub fn extend(&mut self, zero_fraction: f64, one_fraction: f64, feature_index: i32) {
        let depth = self.elements.len();
        self.elements.push(PathElement {
            feature_index,
            zero_fraction,
            one_fraction,
            pweight: if depth == 0 { 1.0 } else { 0.0 },
        });

        let denom = (depth + 1) as f64;
        for i in (0..depth).rev() {
            let carried = one_fraction * self.elements[i].pweight * (i + 1) as f64 / denom;
            self.elements[i + 1].pweight += carried;
            self.elements[i].pweight =
                zero_fraction * self.elements[i].pweight * (depth - i) as f64 / denom;
        }
    }

    /// Remove the element at `path_index`, undoing its effect on the weights.
    pub fn unwind(&mut self, path_index: usize) {
        let depth = self.elements.len() - 1;
        let PathElement {
            zero_fraction,
            one_fraction,
            ..
        } = self.elements[path_index];
        let denom = (depth + 1) as f64;

        let mut next_one_portion = self.elements[depth].pweight;
        for i in (0..depth).rev() {
            if one_fraction != 0.0 {
                let tmp = self.elements[i].pweight;
                self.elements[i].pweight = next_one_portion * denom / ((i + 1) as f64 * one_fraction);
                next_one_portion =
                    tmp - self.elements[i].pweight * zero_fraction * (depth - i) as f64 / denom;
            } else {
                self.elements[i].pweight =
                    self.elements[i].pweight * denom / (zero_fraction * (depth - i) as f64);
            }
        }

        for i in path_index..depth {
            let next = self.elements[i + 1];
            let e = &mut self.elements[i];
            e.feature_index = next.feature_index;
            e.zero_fraction = next.zero_fraction;
            e.one_fraction = next.one_fraction;
        }
        self.elements.pop();
    }

    /// Total permutation weight the path would have if `path_index` were unwound.
    pub fn unwound_sum(&self, path_index: usize) -> f64 {
        let depth = self.elements.len() - 1;
        let PathElement {
            zero_fraction,
            one_fraction,
            ..
        } = self.elements[path_index];
        let denom = (depth + 1) as f64;

        let mut total = 0.0;
        let mut next_one_portion = self.elements[depth].pweight;
        for i in (0..depth).rev() {
            if one_fraction != 0.0 {
                let tmp = next_one_portion * denom / ((i + 1) as f64 * one_fraction);
                total += tmp;
                next_one_portion = self.elements[i].pweight
                    - tmp * zero_fraction * ((depth - i) as f64 / denom);
            } else if zero_fraction != 0.0 {
                total += (self.elements[i].pweight / zero_fraction) / ((depth - i) as f64 / denom);
            }
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn root_sentinel_has_unit_weight() {
        let mut path = PathState::with_capacity(4);
        path.extend(1.0, 1.0, -1);
        assert_eq!(path.len(), 1);
        assert_eq!(path.element(0).pweight, 1.0);
    }

    #[test]
    fn unwind_restores_previous_weights() {
        let mut path = PathState::with_capacity(4);
        path.extend(1.0, 1.0, -1);
        path.extend(0.4, 1.0, 0);
        let before: Vec<f64> = (0..path.len()).map(|i| path.element(i).pweight).collect();

        path.extend(0.3, 0.0, 2);
        path.unwind(path.len() - 1);

        assert_eq!(path.len(), before.len());
        for (i, w) in before.iter().enumerate() {
            assert_abs_diff_eq!(path.element(i).pweight, *w, epsilon = 1e-12);
        }
    }

    #[test]
    fn unwound_sum_single_split() {
        // One split with the sample on the hot side: contribution weight is
        // one_fraction - zero_fraction applied by the caller, unwound sum is 1.
        let mut path = PathState::with_capacity(2);
        path.extend(1.0, 1.0, -1);
        path.extend(0.25, 1.0, 3);
        assert_abs_diff_eq!(path.unwound_sum(1), 1.0, epsilon = 1e-12);
        assert_eq!(path.find(3), Some(1));
        assert_eq!(path.find(-1), None);
    }
}

//! Merging region filters into a single composite effect

use std::sync::Arc;

use smallvec::SmallVec;

use crate::blur::BlurFilter;
use crate::pixmap::Pixmap;
use crate::region::RegionFilter;

/// Region filters merged into one effect, in input order
#[derive(Clone, Debug, PartialEq)]
pub struct MergedEffect {
    filters: SmallVec<[RegionFilter; 4]>,
}

impl MergedEffect {
    pub fn filters(&self) -> &[RegionFilter] {
        &self.filters
    }
}

/// The effect handed to the host for one frame
///
/// `Empty` means "render the original content unmodified".
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CompositeEffect {
    #[default]
    Empty,
    Single(RegionFilter),
    Merged(MergedEffect),
}

/// Merge region filters, collapsing the zero and one filter cases
pub fn compose(filters: impl IntoIterator<Item = RegionFilter>) -> CompositeEffect {
    let mut filters: SmallVec<[RegionFilter; 4]> = filters.into_iter().collect();
    match filters.len() {
        0 => CompositeEffect::Empty,
        1 => match filters.pop() {
            Some(filter) => CompositeEffect::Single(filter),
            None => CompositeEffect::Empty,
        },
        _ => CompositeEffect::Merged(MergedEffect { filters }),
    }
}

impl CompositeEffect {
    pub fn is_empty(&self) -> bool {
        matches!(self, CompositeEffect::Empty)
    }

    /// Number of region filters in the effect
    pub fn len(&self) -> usize {
        self.filters().len()
    }

    /// Region filters in merge order
    pub fn filters(&self) -> &[RegionFilter] {
        match self {
            CompositeEffect::Empty => &[],
            CompositeEffect::Single(filter) => std::slice::from_ref(filter),
            CompositeEffect::Merged(merged) => merged.filters(),
        }
    }

    /// Run the effect over `content` on the CPU
    ///
    /// A pixel takes the output of the first filter whose region covers it;
    /// pixels outside every region keep the original content. Each distinct
    /// blur is applied once.
    pub fn apply(&self, content: &Pixmap) -> Pixmap {
        let filters = self.filters();
        if filters.is_empty() {
            return content.clone();
        }

        let mut blurs: SmallVec<[(&Arc<BlurFilter>, Pixmap); 1]> = SmallVec::new();
        for filter in filters {
            if !blurs.iter().any(|(blur, _)| Arc::ptr_eq(blur, filter.blur())) {
                blurs.push((filter.blur(), filter.blur().apply(content)));
            }
        }

        Pixmap::from_fn(content.width(), content.height(), |x, y| {
            let coord = Pixmap::pixel_center(x, y);
            filters
                .iter()
                .find(|filter| filter.covers(coord))
                .and_then(|filter| {
                    blurs
                        .iter()
                        .find(|(blur, _)| Arc::ptr_eq(blur, filter.blur()))
                        .map(|(_, blurred)| filter.eval_inside(coord, blurred))
                })
                .unwrap_or_else(|| content.eval(coord))
        })
    }
}

use poi::{LayerProperties, Poi};

/// Maximum number of hotspots served per page.
pub const PAGE_SIZE: usize = 256;

/// One page of a layer query, or the full unsliced result while it sits in the
/// session cache.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultPage {
    pub properties: LayerProperties,
    /// Ascending by distance, except that a pinned POI always comes first.
    pub hotspots: Vec<Poi>,
    /// Largest distance observed over the full result, meters. Inflated only when
    /// the page is shaped for the wire.
    pub radius: f64,
    pub more_pages: bool,
    pub next_page_key: Option<u32>,
    /// Number of hotspots in the full result.
    pub total: usize,
}

impl ResultPage {
    pub fn new(properties: LayerProperties, hotspots: Vec<Poi>) -> Self {
        let total = hotspots.len();
        Self {
            properties,
            hotspots,
            radius: 0.0,
            more_pages: false,
            next_page_key: None,
            total,
        }
    }

    /// Largest `distance` over the hotspots, or `floor` if that is larger.
    pub fn observed_radius(hotspots: &[Poi], floor: f64) -> f64 {
        hotspots
            .iter()
            .filter_map(|p| p.distance)
            .fold(floor, f64::max)
    }

    /// Cuts page `page_key` out of a full result.
    ///
    /// Pages past the end are empty. `more_pages`/`next_page_key` are set iff
    /// hotspots remain after this page.
    pub fn slice(&self, page_key: u32) -> ResultPage {
        let len = self.hotspots.len();
        let offset = (page_key as usize).saturating_mul(PAGE_SIZE);
        let hotspots = if offset > len {
            Vec::new()
        } else {
            let count = PAGE_SIZE.min(len - offset);
            self.hotspots[offset..offset + count].to_vec()
        };
        let more_pages = len > offset && len - offset > PAGE_SIZE;
        ResultPage {
            properties: self.properties.clone(),
            hotspots,
            radius: self.radius,
            more_pages,
            next_page_key: more_pages.then(|| (offset / PAGE_SIZE) as u32 + 1),
            total: len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PAGE_SIZE, ResultPage};
    use poi::{LayerProperties, Poi};

    fn full(n: usize) -> ResultPage {
        let hotspots = (0..n as u64)
            .map(|i| {
                let mut poi = Poi::point(i + 1, 0.0, 0.0);
                poi.distance = Some(i as f64);
                poi
            })
            .collect();
        ResultPage::new(LayerProperties::default(), hotspots)
    }

    #[test]
    fn first_page_of_three_hundred() {
        let page = full(300).slice(0);
        assert_eq!(page.hotspots.len(), PAGE_SIZE);
        assert!(page.more_pages);
        assert_eq!(page.next_page_key, Some(1));
        assert_eq!(page.total, 300);
    }

    #[test]
    fn last_page_has_the_remainder() {
        let page = full(300).slice(1);
        assert_eq!(page.hotspots.len(), 44);
        assert!(!page.more_pages);
        assert_eq!(page.next_page_key, None);
        assert_eq!(page.hotspots[0].distance, Some(256.0));
    }

    #[test]
    fn exact_multiple_has_no_extra_page() {
        let result = full(512);
        assert!(result.slice(0).more_pages);
        let second = result.slice(1);
        assert_eq!(second.hotspots.len(), PAGE_SIZE);
        assert!(!second.more_pages);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let page = full(10).slice(3);
        assert!(page.hotspots.is_empty());
        assert!(!page.more_pages);
        assert!(full(0).slice(0).hotspots.is_empty());
    }

    #[test]
    fn observed_radius_keeps_the_floor() {
        let result = full(5);
        assert_eq!(ResultPage::observed_radius(&result.hotspots, 0.0), 4.0);
        assert_eq!(ResultPage::observed_radius(&result.hotspots, 10.0), 10.0);
        assert_eq!(ResultPage::observed_radius(&[], 0.0), 0.0);
    }
}

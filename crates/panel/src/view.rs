use chatforest_core::{
    build_flat_tree, build_forest, resolve_parents, ChatRecord, FlatTree, Forest, ParentMap,
    RecordFilter, SortConfig,
};

/// What the panel currently displays: the fetched records and the forest
/// built from them. The forest is always rebuilt from scratch, so replacing
/// records or changing sort/filter drops selection and expansion state.
#[derive(Debug, Clone, Default)]
pub struct PanelView {
    records: Vec<ChatRecord>,
    parents: ParentMap,
    forest: Forest,
    sort: SortConfig,
    filter: RecordFilter,
    error: Option<String>,
}

impl PanelView {
    pub fn new(sort: SortConfig, filter: RecordFilter) -> Self {
        Self {
            sort,
            filter,
            ..Self::default()
        }
    }

    /// Displayed records, unfiltered, in fetch order.
    pub fn records(&self) -> &[ChatRecord] {
        &self.records
    }

    pub fn record_ids(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.id.as_str()).collect()
    }

    /// True when `records` carries exactly the displayed id sequence.
    pub fn shows_same_ids(&self, records: &[ChatRecord]) -> bool {
        self.records.len() == records.len()
            && self.records.iter().zip(records).all(|(a, b)| a.id == b.id)
    }

    pub fn record(&self, id: &str) -> Option<&ChatRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn parents(&self) -> &ParentMap {
        &self.parents
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn forest_mut(&mut self) -> &mut Forest {
        &mut self.forest
    }

    /// Flat root list over the same records, built on demand.
    pub fn flat_tree(&self) -> FlatTree {
        let visible = self.filter.apply(&self.records);
        build_flat_tree(&visible, &self.parents, &self.sort)
    }

    pub fn sort(&self) -> SortConfig {
        self.sort
    }

    pub fn filter(&self) -> &RecordFilter {
        &self.filter
    }

    /// Last foreground load failure, cleared by the next successful load.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_sort(&mut self, sort: SortConfig) {
        self.sort = sort;
        self.rebuild();
    }

    pub fn set_filter(&mut self, filter: RecordFilter) {
        self.filter = filter;
        self.rebuild();
    }

    pub(crate) fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    pub(crate) fn replace_records(&mut self, records: Vec<ChatRecord>) {
        self.records = records;
        self.rebuild();
    }

    /// Lineage is resolved over every record so a filtered-out parent still
    /// decides which strategy applies; its children surface as roots.
    fn rebuild(&mut self) {
        self.parents = resolve_parents(&self.records);
        let visible = self.filter.apply(&self.records);
        self.forest = build_forest(&visible, &self.parents, &self.sort);
    }
}

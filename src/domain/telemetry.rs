// Chart and tile domain models

#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesPoint {
    pub label: String,
    pub time_ms: i64,
    pub value: f64,
}

impl TimeSeriesPoint {
    pub fn new(label: String, time_ms: i64, value: f64) -> Self {
        Self {
            label,
            time_ms,
            value,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TileData {
    pub id: String,
    pub title: String,
    pub unit: String,
    pub value: f64,
    pub precision: i32,
    pub caption: String,
    pub badge: String,
}

impl TileData {
    pub fn new(
        id: String,
        title: String,
        unit: String,
        value: f64,
        precision: i32,
        caption: String,
        badge: String,
    ) -> Self {
        Self {
            id,
            title,
            unit,
            value,
            precision,
            caption,
            badge,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SeriesData {
    pub id: String,
    pub name: String,
    pub color: Option<String>,
    pub points: Vec<TimeSeriesPoint>,
}

impl SeriesData {
    pub fn new(id: String, name: String, color: Option<String>, points: Vec<TimeSeriesPoint>) -> Self {
        Self {
            id,
            name,
            color,
            points,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChartData {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub unit: Option<String>,
    pub kind: ChartKind,
    pub series: Vec<SeriesData>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    MultiLine,
    Area,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::MultiLine => "multiLine",
            ChartKind::Area => "area",
        }
    }
}

impl ChartData {
    pub fn new(
        id: String,
        title: String,
        subtitle: String,
        unit: Option<String>,
        kind: ChartKind,
        series: Vec<SeriesData>,
    ) -> Self {
        Self {
            id,
            title,
            subtitle,
            unit,
            kind,
            series,
        }
    }
}

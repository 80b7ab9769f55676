// src/reports/layout.rs
//! Column layouts per report kind. A lookup table, not a class hierarchy.

use serde::{Deserialize, Serialize};

use crate::models::ReportKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKey {
    Center,
    Building,
    Movement,
    Species,
    Strain,
    Week,
    Day,
    Headcount,
    BatchWeight,
    WeightPerHead,
    ReferenceWeight,
    Mortality,
    MortalityPct,
    FeedConsumption,
    FeedPerHead,
    WaterConsumption,
    EggsTotal,
    EggsBroken,
    LayingRate,
}

impl ColumnKey {
    /// Text columns that identify a row; totals lines leave them blank.
    pub fn is_descriptive(self) -> bool {
        matches!(
            self,
            ColumnKey::Center
                | ColumnKey::Building
                | ColumnKey::Movement
                | ColumnKey::Species
                | ColumnKey::Strain
                | ColumnKey::Week
                | ColumnKey::Day
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lang {
    #[default]
    Fr,
    Ar,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnSpec {
    pub key: ColumnKey,
    pub label_fr: &'static str,
    pub label_ar: &'static str,
    /// Width in PDF points.
    pub width: f32,
    pub align: Align,
}

impl ColumnSpec {
    pub fn label(&self, lang: Lang) -> &'static str {
        match lang {
            Lang::Fr => self.label_fr,
            Lang::Ar => self.label_ar,
        }
    }
}

/// Upper header cell spanning `span` consecutive columns.
#[derive(Debug, Clone, Serialize)]
pub struct CategorySpec {
    pub label_fr: &'static str,
    pub label_ar: &'static str,
    pub span: usize,
}

impl CategorySpec {
    pub fn label(&self, lang: Lang) -> &'static str {
        match lang {
            Lang::Fr => self.label_fr,
            Lang::Ar => self.label_ar,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportLayoutConfig {
    pub kind: ReportKind,
    pub title_fr: &'static str,
    pub title_ar: &'static str,
    pub columns: &'static [ColumnSpec],
    pub categories: &'static [CategorySpec],
    pub font_size: f32,
    pub header_font_size: f32,
    pub title_font_size: f32,
}

impl ReportLayoutConfig {
    pub fn title(&self, lang: Lang) -> &'static str {
        match lang {
            Lang::Fr => self.title_fr,
            Lang::Ar => self.title_ar,
        }
    }

    pub fn table_width(&self) -> f32 {
        self.columns.iter().map(|c| c.width).sum()
    }

    pub fn has_category_header(&self) -> bool {
        !self.categories.is_empty()
    }

    /// Leading descriptive columns, merged into one label cell on totals lines.
    pub fn label_span(&self) -> usize {
        self.columns
            .iter()
            .take_while(|c| c.key.is_descriptive())
            .count()
            .max(1)
    }
}

const fn col(key: ColumnKey, label_fr: &'static str, label_ar: &'static str, width: f32, align: Align) -> ColumnSpec {
    ColumnSpec { key, label_fr, label_ar, width, align }
}

const fn cat(label_fr: &'static str, label_ar: &'static str, span: usize) -> CategorySpec {
    CategorySpec { label_fr, label_ar, span }
}

static WEIGHT_COLUMNS: [ColumnSpec; 11] = [
    col(ColumnKey::Center, "Centre", "المركز", 70.0, Align::Center),
    col(ColumnKey::Building, "Bâtiment", "المبنى", 70.0, Align::Center),
    col(ColumnKey::Movement, "Lot", "الدفعة", 80.0, Align::Center),
    col(ColumnKey::Species, "Espèce", "النوع", 70.0, Align::Center),
    col(ColumnKey::Strain, "Souche", "السلالة", 80.0, Align::Center),
    col(ColumnKey::Week, "Sem.", "الأسبوع", 50.0, Align::Center),
    col(ColumnKey::Day, "Jour", "اليوم", 45.0, Align::Center),
    col(ColumnKey::Headcount, "Effectif", "العدد", 70.0, Align::Right),
    col(ColumnKey::BatchWeight, "Poids lot", "وزن الدفعة", 85.0, Align::Right),
    col(ColumnKey::WeightPerHead, "Poids/sujet", "الوزن للرأس", 80.0, Align::Right),
    col(ColumnKey::ReferenceWeight, "Poids réf.", "الوزن المرجعي", 85.0, Align::Right),
];

static DAILY_PRODUCTION_COLUMNS: [ColumnSpec; 14] = [
    col(ColumnKey::Center, "Centre", "المركز", 60.0, Align::Center),
    col(ColumnKey::Building, "Bâtiment", "المبنى", 60.0, Align::Center),
    col(ColumnKey::Movement, "Lot", "الدفعة", 70.0, Align::Center),
    col(ColumnKey::Week, "Sem.", "الأسبوع", 40.0, Align::Center),
    col(ColumnKey::Day, "Jour", "اليوم", 40.0, Align::Center),
    col(ColumnKey::Headcount, "Effectif", "العدد", 60.0, Align::Right),
    col(ColumnKey::Mortality, "Nombre", "العدد", 50.0, Align::Right),
    col(ColumnKey::MortalityPct, "%", "%", 50.0, Align::Right),
    col(ColumnKey::FeedConsumption, "Aliment", "العلف", 60.0, Align::Right),
    col(ColumnKey::FeedPerHead, "Alim./sujet", "العلف للرأس", 60.0, Align::Right),
    col(ColumnKey::WaterConsumption, "Eau", "الماء", 60.0, Align::Right),
    col(ColumnKey::EggsTotal, "Oeufs", "البيض", 60.0, Align::Right),
    col(ColumnKey::EggsBroken, "Cassés", "المكسور", 55.0, Align::Right),
    col(ColumnKey::LayingRate, "Ponte %", "نسبة الإنتاج", 60.0, Align::Right),
];

static DAILY_PRODUCTION_CATEGORIES: [CategorySpec; 5] = [
    cat("Identification", "التعريف", 5),
    cat("Effectif", "العدد", 1),
    cat("Mortalité", "النفوق", 2),
    cat("Consommation", "الاستهلاك", 3),
    cat("Production", "الإنتاج", 3),
];

static WEIGHT_LAYOUT: ReportLayoutConfig = ReportLayoutConfig {
    kind: ReportKind::Weight,
    title_fr: "Rapport de pesée",
    title_ar: "تقرير الوزن",
    columns: &WEIGHT_COLUMNS,
    categories: &[],
    font_size: 8.0,
    header_font_size: 8.5,
    title_font_size: 14.0,
};

static DAILY_PRODUCTION_LAYOUT: ReportLayoutConfig = ReportLayoutConfig {
    kind: ReportKind::DailyProduction,
    title_fr: "Rapport de production journalière",
    title_ar: "تقرير الإنتاج اليومي",
    columns: &DAILY_PRODUCTION_COLUMNS,
    categories: &DAILY_PRODUCTION_CATEGORIES,
    font_size: 7.5,
    header_font_size: 8.0,
    title_font_size: 14.0,
};

pub fn layout_for(kind: ReportKind) -> &'static ReportLayoutConfig {
    match kind {
        ReportKind::Weight => &WEIGHT_LAYOUT,
        ReportKind::DailyProduction => &DAILY_PRODUCTION_LAYOUT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_column_counts() {
        assert_eq!(layout_for(ReportKind::Weight).columns.len(), 11);
        assert_eq!(layout_for(ReportKind::DailyProduction).columns.len(), 14);
    }

    #[test]
    fn test_category_spans_cover_columns() {
        for kind in ReportKind::iter() {
            let layout = layout_for(kind);
            if layout.has_category_header() {
                let spanned: usize = layout.categories.iter().map(|c| c.span).sum();
                assert_eq!(spanned, layout.columns.len(), "{}", kind);
            }
        }
        assert!(!layout_for(ReportKind::Weight).has_category_header());
        assert!(layout_for(ReportKind::DailyProduction).has_category_header());
    }

    #[test]
    fn test_tables_fit_landscape_a4() {
        // 842pt wide minus two 28pt margins
        for kind in ReportKind::iter() {
            assert!(layout_for(kind).table_width() <= 786.0, "{}", kind);
        }
    }

    #[test]
    fn test_label_span_covers_descriptive_columns() {
        assert_eq!(layout_for(ReportKind::Weight).label_span(), 7);
        assert_eq!(layout_for(ReportKind::DailyProduction).label_span(), 5);
    }

    #[test]
    fn test_lookup_returns_matching_kind() {
        for kind in ReportKind::iter() {
            assert_eq!(layout_for(kind).kind, kind);
        }
    }
}

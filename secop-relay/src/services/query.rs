//! SODA query construction for the SECOP II processes dataset.

use crate::config::SecopSettings;
use crate::domain::DateSpec;

/// Records per request. Only the first page is ever read; callers narrow the
/// date instead of paging.
pub const PAGE_SIZE: u32 = 1000;
pub const SORT_ORDER: &str = "precio_base DESC";

pub const DEFAULT_MIN_PRICE: u64 = 100_000_000;
pub const DEFAULT_EXCLUDED_MODALITY: &str = "Contratación directa";
/// UNSPSC family 8110: professional engineering services.
pub const DEFAULT_CATEGORY_CODE: &str = "V1.8110";

const DATE_FIELD: &str = "fecha_de_publicacion_del";

/// Fields sent to the model for relevance scoring.
pub const REDUCED_FIELDS: [&str; 10] = [
    "id_del_proceso",
    "entidad",
    "nombre_del_procedimiento",
    "descripci_n_del_procedimiento",
    "precio_base",
    "modalidad_de_contratacion",
    "fecha_de_publicacion_del",
    "departamento_entidad",
    "ciudad_entidad",
    "urlproceso",
];

/// Fields returned by the filtered endpoint.
pub const FULL_FILTERED_FIELDS: [&str; 20] = [
    "id_del_proceso",
    "referencia_del_proceso",
    "entidad",
    "nit_entidad",
    "departamento_entidad",
    "ciudad_entidad",
    "nombre_del_procedimiento",
    "descripci_n_del_procedimiento",
    "fase",
    "fecha_de_publicacion_del",
    "fecha_de_ultima_publicaci",
    "precio_base",
    "modalidad_de_contratacion",
    "tipo_de_contrato",
    "duracion",
    "unidad_de_duracion",
    "codigo_principal_de_categoria",
    "estado_del_procedimiento",
    "adjudicado",
    "urlproceso",
];

/// Named field selections used by the endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSet {
    All,
    Reduced,
    FullFiltered,
}

/// The constant part of every filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedFilters {
    pub min_price: u64,
    pub excluded_modality: String,
    pub category_code: String,
}

impl FixedFilters {
    /// The four fixed predicates, in the order they are emitted.
    pub fn clauses(&self) -> Vec<String> {
        vec![
            "adjudicado = 'No'".to_string(),
            format!("precio_base >= {}", self.min_price),
            format!("modalidad_de_contratacion != '{}'", self.excluded_modality),
            format!("codigo_principal_de_categoria like '%{}%'", self.category_code),
        ]
    }
}

impl Default for FixedFilters {
    fn default() -> Self {
        Self {
            min_price: DEFAULT_MIN_PRICE,
            excluded_modality: DEFAULT_EXCLUDED_MODALITY.to_string(),
            category_code: DEFAULT_CATEGORY_CODE.to_string(),
        }
    }
}

impl From<&SecopSettings> for FixedFilters {
    fn from(settings: &SecopSettings) -> Self {
        Self {
            min_price: settings.min_price,
            excluded_modality: settings.excluded_modality.clone(),
            category_code: settings.category_code.clone(),
        }
    }
}

/// Filters and field lists handed to the query builder at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryProfile {
    pub filters: FixedFilters,
    pub reduced_fields: Vec<String>,
    pub full_filtered_fields: Vec<String>,
}

impl Default for QueryProfile {
    fn default() -> Self {
        Self::new(FixedFilters::default())
    }
}

/// A fully resolved SODA query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub select: String,
    pub where_clause: String,
    pub order: String,
    pub limit: u32,
    pub offset: u32,
}

impl QuerySpec {
    /// `$`-prefixed query-string pairs understood by Socrata.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("$select", self.select.clone()),
            ("$where", self.where_clause.clone()),
            ("$order", self.order.clone()),
            ("$limit", self.limit.to_string()),
            ("$offset", self.offset.to_string()),
        ]
    }
}

impl QueryProfile {
    pub fn new(filters: FixedFilters) -> Self {
        Self {
            filters,
            reduced_fields: REDUCED_FIELDS.iter().map(|f| f.to_string()).collect(),
            full_filtered_fields: FULL_FILTERED_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn fields(&self, set: FieldSet) -> &[String] {
        match set {
            FieldSet::All => &[],
            FieldSet::Reduced => &self.reduced_fields,
            FieldSet::FullFiltered => &self.full_filtered_fields,
        }
    }

    /// Build the query for `fields` published on or after `date`.
    ///
    /// An empty field list selects every column. Values are interpolated as
    /// given; the only per-request input is the already validated date.
    pub fn build_query(&self, fields: &[String], date: DateSpec) -> QuerySpec {
        let select = if fields.is_empty() {
            "*".to_string()
        } else {
            fields.join(",")
        };

        let mut clauses = self.filters.clauses();
        clauses.push(format!("{} >= '{}T00:00:00.000'", DATE_FIELD, date));

        QuerySpec {
            select,
            where_clause: clauses.join(" AND "),
            order: SORT_ORDER.to_string(),
            limit: PAGE_SIZE,
            offset: 0,
        }
    }

    pub fn query_for(&self, set: FieldSet, date: DateSpec) -> QuerySpec {
        self.build_query(self.fields(set), date)
    }
}

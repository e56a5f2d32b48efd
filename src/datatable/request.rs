use std::collections::BTreeMap;

use serde::Deserialize;

use super::DatatableError;
use crate::database::SortDirection;

/// Server-side processing request sent by DataTables
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DtRequest {
    pub draw: i64,
    #[serde(default)]
    pub start: usize,
    /// Page size; zero or negative asks for everything
    #[serde(default = "default_length")]
    pub length: i64,
    #[serde(default)]
    pub order: Vec<DtOrder>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DtOrder {
    /// Position in the entity's derived field order
    pub column: usize,
    #[serde(default)]
    pub dir: SortDirection,
}

fn default_length() -> i64 {
    10
}

impl DtRequest {
    /// Parse a JSON body or, for anything else, a form-encoded one
    pub fn parse(content_type: Option<&str>, body: &[u8]) -> Result<Self, DatatableError> {
        let is_json = content_type
            .map(|ct| ct.trim_start().starts_with("application/json"))
            .unwrap_or(false);
        if is_json {
            serde_json::from_slice(body).map_err(|e| DatatableError::Malformed(e.to_string()))
        } else {
            Self::from_form(body)
        }
    }

    /// `draw=1&start=0&length=10&order[0][column]=2&order[0][dir]=desc`
    pub fn from_form(body: &[u8]) -> Result<Self, DatatableError> {
        let mut draw = None;
        let mut start = 0;
        let mut length = default_length();
        let mut orders: BTreeMap<usize, (Option<usize>, SortDirection)> = BTreeMap::new();

        for (key, value) in url::form_urlencoded::parse(body) {
            match key.as_ref() {
                "draw" => draw = Some(number("draw", &value)?),
                "start" => start = number("start", &value)?,
                "length" => length = number("length", &value)?,
                other => {
                    let Some((index, attr)) = order_key(other) else {
                        continue;
                    };
                    let entry = orders.entry(index).or_insert((None, SortDirection::Asc));
                    match attr {
                        "column" => entry.0 = Some(number("order.column", &value)?),
                        "dir" => entry.1 = direction(&value)?,
                        _ => {}
                    }
                }
            }
        }

        let order = orders
            .into_iter()
            .map(|(index, (column, dir))| {
                column
                    .map(|column| DtOrder { column, dir })
                    .ok_or_else(|| DatatableError::Malformed(format!("order[{}] has no column", index)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DtRequest {
            draw: draw.ok_or(DatatableError::MissingField("draw"))?,
            start,
            length,
            order,
        })
    }

    /// Page size after applying the server cap
    pub fn limit(&self, max_length: usize) -> usize {
        match usize::try_from(self.length) {
            Ok(0) | Err(_) => max_length,
            Ok(n) => n.min(max_length),
        }
    }
}

fn number<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T, DatatableError> {
    value.trim().parse().map_err(|_| DatatableError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

fn direction(value: &str) -> Result<SortDirection, DatatableError> {
    match value {
        "asc" => Ok(SortDirection::Asc),
        "desc" => Ok(SortDirection::Desc),
        other => Err(DatatableError::Malformed(format!("unknown sort direction '{}'", other))),
    }
}

/// `order[3][dir]` -> `(3, "dir")`
fn order_key(key: &str) -> Option<(usize, &str)> {
    let rest = key.strip_prefix("order[")?;
    let (index, rest) = rest.split_once("][")?;
    let attr = rest.strip_suffix(']')?;
    Some((index.parse().ok()?, attr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_datatables_form_body() {
        let body = b"draw=3&columns%5B0%5D%5Bdata%5D=id&start=20&length=10\
                     &order%5B1%5D%5Bcolumn%5D=0&order%5B1%5D%5Bdir%5D=asc\
                     &order%5B0%5D%5Bcolumn%5D=2&order%5B0%5D%5Bdir%5D=desc&search%5Bvalue%5D=";
        let request = DtRequest::parse(Some("application/x-www-form-urlencoded"), body).unwrap();
        assert_eq!(request.draw, 3);
        assert_eq!(request.start, 20);
        assert_eq!(request.length, 10);
        assert_eq!(
            request.order,
            vec![
                DtOrder { column: 2, dir: SortDirection::Desc },
                DtOrder { column: 0, dir: SortDirection::Asc },
            ]
        );
    }

    #[test]
    fn parses_json_body() {
        let body = br#"{"draw": 1, "start": 0, "length": 5, "order": [{"column": 1, "dir": "desc"}]}"#;
        let request = DtRequest::parse(Some("application/json; charset=utf-8"), body).unwrap();
        assert_eq!(request.order, vec![DtOrder { column: 1, dir: SortDirection::Desc }]);
    }

    #[test]
    fn defaults_and_caps() {
        let request = DtRequest::from_form(b"draw=1").unwrap();
        assert_eq!(request.start, 0);
        assert!(request.order.is_empty());
        assert_eq!(request.limit(100), 10);

        let all = DtRequest::from_form(b"draw=1&length=-1").unwrap();
        assert_eq!(all.limit(100), 100);
        let big = DtRequest::from_form(b"draw=1&length=5000").unwrap();
        assert_eq!(big.limit(100), 100);
    }

    #[test]
    fn rejects_malformed_bodies() {
        assert!(matches!(
            DtRequest::from_form(b"start=0"),
            Err(DatatableError::MissingField("draw"))
        ));
        assert!(matches!(
            DtRequest::from_form(b"draw=x"),
            Err(DatatableError::InvalidNumber { field: "draw", .. })
        ));
        assert!(DtRequest::from_form(b"draw=1&order[0][dir]=asc").is_err());
        assert!(DtRequest::from_form(b"draw=1&order[0][column]=1&order[0][dir]=up").is_err());
        assert!(DtRequest::parse(Some("application/json"), b"{").is_err());
    }
}

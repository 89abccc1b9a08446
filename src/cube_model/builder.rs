use super::{CubeRequest, CubeStoreError, Dimension, Hierarchy, Level, Measure};
use crate::document::Element;

/// Checks the shape constraints of a request without building anything.
pub fn validate(request: &CubeRequest) -> Result<(), CubeStoreError> {
    if request.cube_name.trim().is_empty() {
        return Err(invalid("cube_name must not be empty"));
    }
    if request.table_name.trim().is_empty() {
        return Err(invalid("table_name must not be empty"));
    }
    if request.dimensions.is_empty() {
        return Err(invalid("at least one dimension is required"));
    }
    if request.measures.is_empty() {
        return Err(invalid("at least one measure is required"));
    }

    for dimension in &request.dimensions {
        if dimension.hierarchies.is_empty() {
            return Err(invalid(&format!(
                "dimension '{}' must have at least one hierarchy",
                dimension.name
            )));
        }
        for hierarchy in &dimension.hierarchies {
            if hierarchy.levels.is_empty() {
                return Err(invalid(&format!(
                    "hierarchy '{}' of dimension '{}' must have at least one level",
                    hierarchy.name.as_deref().unwrap_or_default(),
                    dimension.name
                )));
            }
        }
    }
    Ok(())
}

/// Builds a detached `<Cube>` element from a validated request.
pub fn build_cube(request: &CubeRequest) -> Result<Element, CubeStoreError> {
    validate(request)?;

    let mut cube = Element::new("Cube").with_attribute("name", request.cube_name.as_str());
    cube.push_child(Element::new("Table").with_attribute("name", request.table_name.as_str()));

    for dimension in &request.dimensions {
        cube.push_child(dimension_element(dimension));
    }
    for measure in &request.measures {
        cube.push_child(measure_element(measure));
    }
    Ok(cube)
}

fn dimension_element(dimension: &Dimension) -> Element {
    let mut element = Element::new("Dimension").with_attribute("name", dimension.name.as_str());
    for hierarchy in &dimension.hierarchies {
        element.push_child(hierarchy_element(hierarchy));
    }
    element
}

fn hierarchy_element(hierarchy: &Hierarchy) -> Element {
    let mut element = Element::new("Hierarchy");
    element.push_optional_attribute("name", non_empty(&hierarchy.name));
    element.push_attribute("hasAll", hierarchy.has_all.to_string());
    element.push_optional_attribute("allMemberName", non_empty(&hierarchy.all_member_name));
    for level in &hierarchy.levels {
        element.push_child(level_element(level));
    }
    element
}

fn level_element(level: &Level) -> Element {
    let mut element = Element::new("Level")
        .with_attribute("name", level.name.as_str())
        .with_attribute("column", level.column.as_str())
        .with_attribute("type", level.level_type.as_str());
    element.push_optional_attribute("uniqueMembers", level.unique_members.map(|u| u.to_string()));
    element
}

fn measure_element(measure: &Measure) -> Element {
    let mut element = Element::new("Measure")
        .with_attribute("name", measure.name.as_str())
        .with_attribute("column", measure.column.as_str())
        .with_attribute("aggregator", measure.aggregator.as_str());
    element.push_optional_attribute("formatString", non_empty(&measure.format_string));
    element
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn invalid(message: &str) -> CubeStoreError {
    CubeStoreError::Validation(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn request() -> CubeRequest {
        CubeRequest {
            cube_name: "Sales".to_string(),
            table_name: "sales_fact".to_string(),
            dimensions: vec![Dimension {
                name: "Time".to_string(),
                hierarchies: vec![Hierarchy::new(vec![Level::new("Year", "yr")])],
            }],
            measures: vec![Measure::new("Revenue", "rev")],
        }
    }

    fn attribute_keys(element: &Element) -> Vec<&str> {
        element.attributes.iter().map(|(k, _)| k.as_str()).collect()
    }

    #[rstest]
    fn test_build_applies_defaults(request: CubeRequest) {
        let cube = build_cube(&request).unwrap();
        assert_eq!(cube.attribute("name"), Some("Sales"));

        let names: Vec<_> = cube.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Table", "Dimension", "Measure"]);
        assert_eq!(cube.children[0].attribute("name"), Some("sales_fact"));

        let hierarchy = &cube.children[1].children[0];
        assert_eq!(attribute_keys(hierarchy), vec!["hasAll"]);
        assert_eq!(hierarchy.attribute("hasAll"), Some("true"));

        let level = &hierarchy.children[0];
        assert_eq!(attribute_keys(level), vec!["name", "column", "type"]);
        assert_eq!(level.attribute("type"), Some("String"));

        let measure = &cube.children[2];
        assert_eq!(attribute_keys(measure), vec!["name", "column", "aggregator"]);
        assert_eq!(measure.attribute("aggregator"), Some("sum"));
    }

    #[rstest]
    fn test_build_emits_optional_fields_when_set(mut request: CubeRequest) {
        let hierarchy = &mut request.dimensions[0].hierarchies[0];
        hierarchy.name = Some("Calendar".to_string());
        hierarchy.has_all = false;
        hierarchy.all_member_name = Some("All Years".to_string());
        hierarchy.levels[0].unique_members = Some(false);
        request.measures[0].format_string = Some("#,###".to_string());

        let cube = build_cube(&request).unwrap();
        let hierarchy = &cube.children[1].children[0];
        assert_eq!(attribute_keys(hierarchy), vec!["name", "hasAll", "allMemberName"]);
        assert_eq!(hierarchy.attribute("hasAll"), Some("false"));
        assert_eq!(hierarchy.children[0].attribute("uniqueMembers"), Some("false"));
        assert_eq!(cube.children[2].attribute("formatString"), Some("#,###"));
    }

    #[rstest]
    fn test_build_preserves_caller_order(mut request: CubeRequest) {
        request.dimensions.push(Dimension {
            name: "Store".to_string(),
            hierarchies: vec![Hierarchy::new(vec![
                Level::new("Country", "country"),
                Level::new("City", "city"),
            ])],
        });
        request.measures.insert(0, Measure::new("Units", "units"));

        let cube = build_cube(&request).unwrap();
        let names: Vec<_> = cube
            .children
            .iter()
            .map(|c| c.attribute("name").unwrap())
            .collect();
        assert_eq!(names, vec!["sales_fact", "Time", "Store", "Units", "Revenue"]);

        let levels: Vec<_> = cube.children[2].children[0]
            .children
            .iter()
            .map(|l| l.attribute("name").unwrap())
            .collect();
        assert_eq!(levels, vec!["Country", "City"]);
    }

    #[rstest]
    #[case::empty_cube_name(|r: &mut CubeRequest| r.cube_name.clear())]
    #[case::empty_table_name(|r: &mut CubeRequest| r.table_name.clear())]
    #[case::no_dimensions(|r: &mut CubeRequest| r.dimensions.clear())]
    #[case::no_measures(|r: &mut CubeRequest| r.measures.clear())]
    #[case::no_hierarchies(|r: &mut CubeRequest| r.dimensions[0].hierarchies.clear())]
    #[case::no_levels(|r: &mut CubeRequest| r.dimensions[0].hierarchies[0].levels.clear())]
    fn test_invalid_requests_are_rejected(
        mut request: CubeRequest,
        #[case] mutate: fn(&mut CubeRequest),
    ) {
        mutate(&mut request);
        assert!(matches!(
            build_cube(&request),
            Err(CubeStoreError::Validation(_))
        ));
    }
}

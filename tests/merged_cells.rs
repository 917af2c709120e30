use sheet_model::{CellReference, CellValue, ModelError, RangeReference, Workbook};

fn r(text: &str) -> CellReference {
    CellReference::parse(text).unwrap()
}

fn range(text: &str) -> RangeReference {
    RangeReference::parse(text).unwrap()
}

#[test]
fn merging_keeps_the_anchor_and_clears_the_rest() {
    let mut wb = Workbook::new();
    let sheet = wb.active_sheet_mut();
    sheet.set_value(r("A1"), "keep").unwrap();
    sheet.set_value(r("B1"), "drop").unwrap();
    sheet.cell_mut(r("B2")).set_formula("=A1*2");

    sheet.merge_cells(range("A1:B2")).unwrap();

    assert_eq!(sheet.value(r("A1")), CellValue::Text("keep".to_string()));
    assert_eq!(sheet.value(r("B1")), CellValue::Empty);
    assert!(!sheet.cell(r("B2")).unwrap().has_formula());
    assert_eq!(sheet.merged_ranges(), &[range("A1:B2")]);
}

#[test]
fn merge_registration_order_is_preserved() {
    let mut wb = Workbook::new();
    let sheet = wb.active_sheet_mut();
    sheet.merge_cells(range("D4:E5")).unwrap();
    sheet.merge_cells(range("A1:B2")).unwrap();
    assert_eq!(sheet.merged_ranges(), &[range("D4:E5"), range("A1:B2")]);
}

#[test]
fn overlap_is_rejected_even_at_a_single_corner() {
    let mut wb = Workbook::new();
    let sheet = wb.active_sheet_mut();
    sheet.merge_cells(range("B2:D4")).unwrap();

    for overlapping in ["A1:B2", "D4:E5", "C1:C9", "B2:D4"] {
        assert!(
            matches!(
                sheet.merge_cells(range(overlapping)),
                Err(ModelError::InvalidParameter(_))
            ),
            "{overlapping} overlaps B2:D4"
        );
    }
    // Adjacent is fine.
    sheet.merge_cells(range("E2:F4")).unwrap();
    assert_eq!(sheet.merged_ranges().len(), 2);
}

#[test]
fn unmerging_requires_a_registered_range() {
    let mut wb = Workbook::new();
    let sheet = wb.active_sheet_mut();
    sheet.merge_cells(range("A1:C3")).unwrap();

    // A subrange of a merge is not the merge.
    assert!(matches!(
        sheet.unmerge_cells(range("A1:B2")),
        Err(ModelError::KeyNotFound(_))
    ));

    sheet.unmerge_cells(range("A1:C3")).unwrap();
    assert!(sheet.merged_ranges().is_empty());
    assert!(matches!(
        sheet.unmerge_cells(range("A1:C3")),
        Err(ModelError::KeyNotFound(_))
    ));
}

#[test]
fn merge_lookup_by_cell() {
    let mut wb = Workbook::new();
    let sheet = wb.active_sheet_mut();
    sheet.merge_cells(range("B2:C3")).unwrap();

    assert_eq!(sheet.merge_containing(r("C2")), Some(&range("B2:C3")));
    assert_eq!(sheet.merge_containing(r("D2")), None);
}

#[test]
fn formatting_on_covered_cells_survives_a_merge() {
    let mut wb = Workbook::new();
    let id = wb.active_sheet().id();
    let format_id = wb.stylesheet_mut().create_format();
    wb.set_cell_format(id, r("B2"), format_id).unwrap();
    wb.set_cell_value(id, r("B2"), "text").unwrap();

    wb.active_sheet_mut().merge_cells(range("A1:B2")).unwrap();

    let cell = wb.active_sheet().cell(r("B2")).unwrap();
    assert_eq!(cell.value, CellValue::Empty);
    assert_eq!(cell.format_id, Some(format_id));
    assert_eq!(wb.stylesheet().format_reference_count(format_id), 1);
}

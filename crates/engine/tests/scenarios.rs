// tests/scenarios.rs

use rowmend_core::{
    BankVariant, ChangeEvent, ColumnRole, EmptyAmountPolicy, FieldValue, NormalizedTable, RawRow,
};
use rowmend_engine::classify::is_date_like;
use rowmend_engine::{
    read_raw_rows, statement_lines, ConsolidatedRow, Realigner, SchemaResolver, StatementEngine,
};
use rust_decimal::Decimal;
use std::str::FromStr;

fn row(cells: &[&str]) -> RawRow {
    cells.iter().map(|c| c.to_string()).collect()
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn text<'a>(table: &'a NormalizedTable, index: usize, role: ColumnRole) -> &'a str {
    table
        .field(&table.records[index], role)
        .and_then(FieldValue::as_text)
        .unwrap_or("")
}

fn amount(table: &NormalizedTable, index: usize, role: ColumnRole) -> Option<Decimal> {
    table.field(&table.records[index], role).and_then(FieldValue::as_amount)
}

const CURRENT_HEADER: &[&str] = &["Date", "Particulars", "Withdrawals", "Deposits", "Balance"];

fn hdfc_header() -> RawRow {
    row(&[
        "Date", "Narration", "Chq./Ref.No.", "Value Dt", "Withdrawal Amt.", "Deposit Amt.", "Closing Balance",
    ])
}

// ── Scenario A: continuation rows ─────────────────────────────────────────────

#[test]
fn test_continuation_row_joins_description() {
    let rows = vec![
        row(CURRENT_HEADER),
        row(&["01-04-2024", "UPI-ASHOK", "", "", "1000"]),
        row(&["", "0033-445806-NA", "", "", ""]),
        row(&["02-04-2024", "UPI-VIRU", "50", "", "950"]),
    ];
    let engine = StatementEngine::for_bank(BankVariant::CanaraCurrent).unwrap();
    let out = engine.run(&rows).unwrap();
    let t = &out.table;

    assert_eq!(t.len(), 2);
    assert_eq!(text(t, 0, ColumnRole::Description), "UPI-ASHOK 0033-445806-NA");
    assert_eq!(amount(t, 0, ColumnRole::Balance), Some(dec("1000")));

    assert_eq!(text(t, 1, ColumnRole::Date), "02-04-2024");
    assert_eq!(text(t, 1, ColumnRole::Description), "UPI-VIRU");
    assert_eq!(amount(t, 1, ColumnRole::Debit), Some(dec("50")));
    assert_eq!(t.field(&t.records[1], ColumnRole::Credit), Some(&FieldValue::Empty));
    assert_eq!(amount(t, 1, ColumnRole::Balance), Some(dec("950")));

    assert_eq!(out.report.summary().rows_merged, 1);
    assert!(out.report.events().contains(&ChangeEvent::RowMerged { row: 2, into: 1 }));
}

// ── Scenario B: anchor shift ──────────────────────────────────────────────────

#[test]
fn test_blank_reference_pulls_row_left() {
    let mut profile = BankVariant::Hdfc.profile();
    profile.repairs.balance_rotation = false;
    profile.empty_amount = EmptyAmountPolicy::Null;
    let engine = StatementEngine::new(profile).unwrap();

    let rows = vec![
        hdfc_header(),
        row(&["01/04/24", "UPI-ASHOK", "", "0000412345", "01/04/24", "500.00", "10,500.00"]),
    ];
    let out = engine.run(&rows).unwrap();
    let t = &out.table;

    assert_eq!(text(t, 0, ColumnRole::Reference), "0000412345");
    assert_eq!(text(t, 0, ColumnRole::ValueDate), "01/04/24");
    assert_eq!(amount(t, 0, ColumnRole::Debit), Some(dec("500.00")));
    assert_eq!(amount(t, 0, ColumnRole::Credit), Some(dec("10500.00")));
    let last = t.records[0].fields.last().unwrap();
    assert!(last.is_empty());
    assert_eq!(out.report.summary().columns_shifted, 1);
}

#[test]
fn test_hdfc_preset_shifts_then_rotates() {
    let engine = StatementEngine::for_bank(BankVariant::Hdfc).unwrap();
    let rows = vec![
        hdfc_header(),
        row(&["01/04/24", "UPI-ASHOK", "", "0000412345", "01/04/24", "500.00", "10,500.00"]),
        row(&["02/04/24", "ATM WDL", "ATM77", "02/04/24", "1,000.00", "", "9,500.00"]),
    ];
    let out = engine.run(&rows).unwrap();
    let t = &out.table;

    assert_eq!(amount(t, 0, ColumnRole::Debit), Some(Decimal::ZERO));
    assert_eq!(amount(t, 0, ColumnRole::Credit), Some(dec("500.00")));
    assert_eq!(amount(t, 0, ColumnRole::Balance), Some(dec("10500.00")));

    assert_eq!(amount(t, 1, ColumnRole::Debit), Some(dec("1000.00")));
    assert_eq!(amount(t, 1, ColumnRole::Credit), Some(Decimal::ZERO));
    assert_eq!(amount(t, 1, ColumnRole::Balance), Some(dec("9500.00")));

    let s = out.report.summary();
    assert_eq!(s.columns_shifted, 1);
    assert_eq!(s.balance_rotations, 1);
}

// ── Scenario C: repeated header ───────────────────────────────────────────────

fn paged_statement() -> Vec<RawRow> {
    let mut rows = vec![row(CURRENT_HEADER)];
    for i in 1..40 {
        let desc = format!("TXN {i}");
        if i % 5 == 0 {
            rows.push(row(&["", desc.as_str(), "", "", ""]));
        } else {
            let date = format!("{:02}-04-2024", (i % 28) + 1);
            rows.push(row(&[date.as_str(), desc.as_str(), "10.00", "", "500.00"]));
        }
    }
    rows.push(row(CURRENT_HEADER));
    for i in 41..50 {
        let desc = format!("TXN {i}");
        let date = format!("{:02}-05-2024", (i % 28) + 1);
        rows.push(row(&[date.as_str(), desc.as_str(), "", "20.00", "520.00"]));
    }
    rows
}

#[test]
fn test_repeated_header_is_removed() {
    let rows = paged_statement();
    assert_eq!(rows[40], row(CURRENT_HEADER));

    let engine = StatementEngine::for_bank(BankVariant::CanaraCurrent).unwrap();
    let out = engine.run(&rows).unwrap();

    for record in &out.table.records {
        let texts: Vec<String> = record.fields.iter().map(|f| f.to_string()).collect();
        assert_ne!(texts, row(CURRENT_HEADER));
        assert!(!texts.iter().any(|t| t == "Particulars"));
    }
    assert_eq!(out.report.summary().duplicate_headers_removed, 1);
    assert!(out
        .report
        .events()
        .contains(&ChangeEvent::DuplicateHeaderRemoved { row: 40, rows: 1 }));
}

// ── Scenario D: orphan before the first date ──────────────────────────────────

#[test]
fn test_orphan_amount_row_is_discarded() {
    let rows = vec![
        row(CURRENT_HEADER),
        row(&["", "OPENING BALANCE", "", "", "5,000.00"]),
        row(&["01-04-2024", "UPI-ASHOK", "", "", "1000"]),
        row(&["02-04-2024", "UPI-VIRU", "50", "", "950"]),
    ];
    let engine = StatementEngine::for_bank(BankVariant::CanaraCurrent).unwrap();
    let out = engine.run(&rows).unwrap();

    assert_eq!(out.table.len(), 2);
    assert_eq!(text(&out.table, 0, ColumnRole::Description), "UPI-ASHOK");
    assert_eq!(amount(&out.table, 0, ColumnRole::Balance), Some(dec("1000")));
    assert!(out
        .report
        .events()
        .contains(&ChangeEvent::OrphanDiscarded { row: 1, had_amount: true }));
}

// ── Properties ────────────────────────────────────────────────────────────────

#[test]
fn test_every_record_has_a_date() {
    let engine = StatementEngine::for_bank(BankVariant::CanaraCurrent).unwrap();
    let out = engine.run(&paged_statement()).unwrap();
    assert!(!out.table.is_empty());
    for (i, _) in out.table.records.iter().enumerate() {
        assert!(is_date_like(text(&out.table, i, ColumnRole::Date)));
    }
}

#[test]
fn test_record_count_matches_dated_rows() {
    let rows = paged_statement();
    let dated = rows.iter().filter(|r| is_date_like(&r[0])).count();
    let engine = StatementEngine::for_bank(BankVariant::CanaraCurrent).unwrap();
    let out = engine.run(&rows).unwrap();
    assert_eq!(out.report.summary().orphan_rows_discarded, 0);
    assert_eq!(out.table.len(), dated);
}

#[test]
fn test_record_count_bounded_with_orphans() {
    let mut rows = vec![row(CURRENT_HEADER), row(&["", "stray", "", "", "1.00"])];
    rows.extend(paged_statement().into_iter().skip(1));
    let dated = rows.iter().filter(|r| is_date_like(&r[0])).count();
    let engine = StatementEngine::for_bank(BankVariant::CanaraCurrent).unwrap();
    let out = engine.run(&rows).unwrap();
    assert!(out.table.len() <= dated);
}

#[test]
fn test_descriptions_accumulate_in_order() {
    let rows = vec![
        row(CURRENT_HEADER),
        row(&["01-04-2024", "NEFT", "", "", "1000"]),
        row(&["", "ACME", "", "", ""]),
        row(&["", "CORP", "", "", ""]),
        row(&["", "INVOICE 7", "", "", ""]),
    ];
    let engine = StatementEngine::for_bank(BankVariant::CanaraCurrent).unwrap();
    let out = engine.run(&rows).unwrap();
    assert_eq!(text(&out.table, 0, ColumnRole::Description), "NEFT ACME CORP INVOICE 7");
}

#[test]
fn test_continuation_never_overwrites_amounts() {
    let rows = vec![
        row(CURRENT_HEADER),
        row(&["01-04-2024", "NEFT", "75.00", "", "1000"]),
        row(&["", "", "99.00", "12.00", "4000"]),
    ];
    let engine = StatementEngine::for_bank(BankVariant::CanaraCurrent).unwrap();
    let out = engine.run(&rows).unwrap();
    assert_eq!(amount(&out.table, 0, ColumnRole::Debit), Some(dec("75.00")));
    assert_eq!(amount(&out.table, 0, ColumnRole::Credit), Some(dec("12.00")));
    assert_eq!(amount(&out.table, 0, ColumnRole::Balance), Some(dec("1000")));
}

#[test]
fn test_realigner_is_idempotent() {
    let profile = BankVariant::Hdfc.profile();
    let layout = SchemaResolver::new(&profile).resolve(&hdfc_header(), 7).unwrap();
    let realigner = Realigner::new(&layout, &profile.repairs);
    let input = vec![
        ConsolidatedRow {
            source_row: 1,
            cells: row(&["01/04/24", "UPI", "", "R1", "01/04/24", "5.00", "105.00"]),
        },
        ConsolidatedRow {
            source_row: 2,
            cells: row(&["02/04/24", "NEFT", "R2", "02/04/24", "7.00", "112.00", ""]),
        },
        ConsolidatedRow {
            source_row: 3,
            cells: row(&["03/04/24", "ATM", "R3", "03/04/24", "2.00", "", "110.00"]),
        },
    ];

    let mut report = rowmend_core::ChangeReport::new();
    let once = realigner.realign(input, &mut report).unwrap();
    let mut again = rowmend_core::ChangeReport::new();
    let twice = realigner.realign(once.clone(), &mut again).unwrap();
    assert_eq!(once, twice);
    assert!(again.is_empty());
}

// ── Keyword-heavy text rows ──────────────────────────────────────────────────

#[test]
fn test_keyword_heavy_preamble_is_skipped() {
    let rows = vec![
        row(&["Summary of Deposits, Withdrawals and Balance", "", "", "", ""]),
        row(CURRENT_HEADER),
        row(&["01-04-2024", "UPI-ASHOK", "", "", "1000"]),
    ];
    let engine = StatementEngine::for_bank(BankVariant::CanaraCurrent).unwrap();
    let out = engine.run(&rows).unwrap();
    assert_eq!(out.table.len(), 1);
    assert_eq!(out.table.labels(), CURRENT_HEADER.to_vec());
    assert_eq!(out.report.summary().preamble_rows_skipped, 1);
}

#[test]
fn test_keyword_heavy_continuation_joins_description() {
    let rows = vec![
        row(CURRENT_HEADER),
        row(&["01-04-2024", "NEFT", "", "500", "1500"]),
        row(&["", "CASH DEPOSIT MIN BALANCE WITHDRAWAL CHG REV", "", "", ""]),
    ];
    let engine = StatementEngine::for_bank(BankVariant::CanaraCurrent).unwrap();
    let out = engine.run(&rows).unwrap();
    assert_eq!(
        text(&out.table, 0, ColumnRole::Description),
        "NEFT CASH DEPOSIT MIN BALANCE WITHDRAWAL CHG REV"
    );
    assert_eq!(out.report.summary().duplicate_headers_removed, 0);
}

#[test]
fn test_reflowed_kotak_header_is_not_narration() {
    let rows = vec![
        row(&["", "", "", "Withdrawal(Dr)/", ""]),
        row(&["Date", "Narration", "Chq/Ref No", "", "Balance"]),
        row(&["", "", "", "Deposit(Cr)", ""]),
        row(&["01-04-2024", "NEFT", "R1", "1,500.00(Dr)", "23,410.55(Cr)"]),
        row(&["Date", "Narration", "Chq/Ref No", "Withdrawal(Dr)/ Deposit(Cr)", "Balance"]),
        row(&["02-04-2024", "IMPS", "R2", "200.00(Cr)", "23,610.55(Cr)"]),
    ];
    let engine = StatementEngine::for_bank(BankVariant::Kotak).unwrap();
    let out = engine.run(&rows).unwrap();
    let t = &out.table;
    assert_eq!(t.len(), 2);
    assert_eq!(text(t, 0, ColumnRole::Description), "NEFT");
    assert_eq!(amount(t, 1, ColumnRole::Credit), Some(dec("200.00")));
    assert_eq!(out.report.summary().duplicate_headers_removed, 1);
    assert_eq!(out.report.summary().date_cell_texts_moved, 0);
}

// ── Wrapped Dr/Cr amounts ─────────────────────────────────────────────────────

#[test]
fn test_wrapped_marked_amount_fills_debit() {
    let rows = vec![
        row(&["", "", "", "Withdrawal(Dr)/", ""]),
        row(&["Date", "Narration", "Chq/Ref No", "", "Balance"]),
        row(&["", "", "", "Deposit(Cr)", ""]),
        row(&["01-04-2024", "NEFT", "R1", "", "23,410.55(Cr)"]),
        row(&["", "ACME", "", "1,500.00(Dr)", ""]),
    ];
    let engine = StatementEngine::for_bank(BankVariant::Kotak).unwrap();
    let out = engine.run(&rows).unwrap();
    assert_eq!(amount(&out.table, 0, ColumnRole::Debit), Some(dec("1500.00")));
    assert_eq!(text(&out.table, 0, ColumnRole::Description), "NEFT ACME");
}

// ── Fixture: Kotak extract ────────────────────────────────────────────────────

#[test]
fn test_kotak_extract_end_to_end() {
    let rows = read_raw_rows(include_str!("fixtures/kotak_extract.csv").as_bytes()).unwrap();
    let engine = StatementEngine::for_bank(BankVariant::Kotak).unwrap();
    let out = engine.run(&rows).unwrap();
    let t = &out.table;

    assert_eq!(
        t.labels(),
        vec!["Date", "Narration", "Chq/Ref No", "Withdrawal(Dr)", "Balance", "Deposit(Cr)"]
    );
    assert_eq!(t.len(), 3);

    assert_eq!(text(t, 0, ColumnRole::Description), "UPI/PAID TO ASHOK KIRANA STORE");
    assert_eq!(amount(t, 0, ColumnRole::Debit), Some(dec("1500.00")));
    assert_eq!(amount(t, 0, ColumnRole::Balance), Some(dec("23410.55")));

    assert_eq!(text(t, 1, ColumnRole::Date), "02-04-2024");
    assert_eq!(text(t, 1, ColumnRole::Reference), "NEFT8812");
    assert_eq!(text(t, 1, ColumnRole::Description), "SALARY APRIL ACME CORP");
    assert_eq!(amount(t, 1, ColumnRole::Credit), Some(dec("50000.00")));
    assert_eq!(amount(t, 1, ColumnRole::Balance), Some(dec("73410.55")));
    assert_eq!(t.field(&t.records[1], ColumnRole::Debit), Some(&FieldValue::Empty));

    assert_eq!(text(t, 2, ColumnRole::Reference), "ATM-01");

    let s = out.report.summary();
    assert_eq!(s.preamble_rows_skipped, 2);
    assert_eq!(s.duplicate_headers_removed, 1);
    assert_eq!(s.trailer_rows_dropped, 2);
    assert_eq!(s.date_prefixes_split, 1);
    assert_eq!(s.date_cell_texts_moved, 1);
    assert_eq!(s.drcr_splits, 1);

    let lines = statement_lines(t);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[2].debit, Some(dec("2000.00")));
}

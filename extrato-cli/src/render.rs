//! Plain-text rendering of the read-model.

use std::fmt::Write;

use extrato_feed::FeedView;

pub fn render_view(view: &FeedView) -> String {
    let mut out = String::new();

    if let Some(ctx) = &view.context {
        let title = view
            .subject
            .as_ref()
            .map(|s| s.name.as_str())
            .unwrap_or(ctx.subject_id.as_str());
        let _ = writeln!(out, "# {} ({}) {}", title, ctx.kind.as_str(), ctx.period);
        if let Some(search) = &ctx.search {
            let _ = writeln!(out, "search: {search}");
        }
    }

    let s = &view.summary;
    let _ = writeln!(
        out,
        "opening {:.2} | in {:.2} | out {:.2} | closing {:.2}\n",
        s.opening_balance, s.total_in, s.total_out, s.closing_balance
    );

    if view.transactions.is_empty() {
        out.push_str("(no transactions)\n");
    }
    for tx in &view.transactions {
        let _ = write!(
            out,
            "{}  {:<24} {:<32} {:>12.2}",
            tx.date.format("%d/%m/%Y"),
            tx.classification.label,
            truncate(&tx.classification.counterparty, 32),
            tx.amount
        );
        if let Some(label) = &tx.installment_label {
            let _ = write!(out, "  {label}");
        }
        if let Some(category) = &tx.category {
            let _ = write!(out, "  [{category}]");
        }
        out.push('\n');
    }

    let p = &view.pagination;
    let _ = write!(
        out,
        "\n{} rows | page {} of {}",
        view.transactions.len(),
        p.page.max(1),
        p.total_pages.max(1)
    );
    if view.has_more {
        out.push_str(" | more available");
    }
    out.push('\n');
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut t: String = s.chars().take(max.saturating_sub(1)).collect();
    t.push('…');
    t
}

use schedex_core::pipeline::{DetectionSummary, FailedItem, RunSummary};

pub fn print_detection(summary: &DetectionSummary) {
    println!("=== Detection ({}) ===\n", summary.strategy);

    for page in &summary.pages {
        println!(
            "  {} ({}x{}): {} region(s)",
            page.page,
            page.width,
            page.height,
            page.regions.len()
        );
        for region in &page.regions {
            let r = region.padded;
            println!(
                "    {:<16} x={:<5} y={:<5} {}x{}",
                region.name, r.x, r.y, r.width, r.height
            );
        }
    }

    println!(
        "\n  {} region(s) on {} page(s), crops in {}",
        summary.region_count(),
        summary.pages.len(),
        summary.debug_dir.display()
    );
    print_failures(&summary.failed_items);
}

pub fn print_run(summary: &RunSummary) {
    println!("=== Extraction ({}) ===\n", summary.strategy);

    let width = summary
        .pages
        .iter()
        .map(|p| p.page.len())
        .max()
        .unwrap_or(10);

    for page in &summary.pages {
        let panels = if page.panels.is_empty() {
            "-".to_string()
        } else {
            page.panels.join(", ")
        };
        println!(
            "  {:<width$}  {} region(s)  {}",
            page.page,
            page.regions,
            panels,
            width = width
        );
        for failure in page.parse_failures.iter().chain(&page.failed_regions) {
            println!("  {:<width$}    ! {}", "", failure, width = width);
        }
    }

    let empty: usize = summary.pages.iter().map(|p| p.empty_regions).sum();
    println!(
        "\n  Pages: {}  Panels: {}  Empty: {}  Parse failures: {}",
        summary.pages.len(),
        summary.panel_count(),
        empty,
        summary.parse_failure_count()
    );

    let outputs = &summary.outputs;
    if summary.panel_count() > 0 {
        println!("\n  Written:");
        println!("    {}", outputs.headers_csv.display());
        println!("    {}", outputs.circuits_csv.display());
        println!("    {}", outputs.combined_csv.display());
        if let Some(ref workbook) = outputs.workbook {
            println!("    {}", workbook.display());
        }
    }
    print_failures(&summary.failed_items);
}

fn print_failures(failed: &[FailedItem]) {
    if failed.is_empty() {
        return;
    }
    println!("\n  Failed ({}):", failed.len());
    for item in failed {
        println!("    {}: {}", item.item, item.reason);
    }
}

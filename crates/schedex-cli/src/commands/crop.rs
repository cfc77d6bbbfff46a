use schedex_core::detect::layout::FixedLayout;
use schedex_core::detect::{safe_file_stem, save_crops};
use schedex_core::error::SchedexError;
use schedex_core::render::load_image;
use std::path::Path;

pub fn run(image: &Path, layout: &Path, out_dir: &Path) -> Result<(), SchedexError> {
    let layout = FixedLayout::load(layout)?;
    let page = load_image(image)?;
    let regions = layout.crop(&page);

    std::fs::create_dir_all(out_dir)?;
    let saved = save_crops(&regions, out_dir, |_, region| {
        format!("{}.png", safe_file_stem(&region.name))
    });

    for path in &saved {
        println!("{}", path.display());
    }
    let skipped = layout.boxes.len() - regions.len();
    eprintln!(
        "Saved {} of {} crop(s) to {}",
        saved.len(),
        layout.boxes.len(),
        out_dir.display()
    );
    if skipped > 0 {
        eprintln!("  {skipped} box(es) had no area at this page size");
    }
    Ok(())
}

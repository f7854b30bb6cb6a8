mod export;

pub use export::{
    DISCOUNTS_STEM, ExportError, INVENTORY_STEM, dated_filename, export_devices, export_discounts,
};

//! Builds a small ring, mutates it, and writes Graphviz dumps to ./dumps.
//!
//! Run with: cargo run --example export_demo

use ringlist::{CallSite, RingList, Slot};
use ringlist_dump::{DumpOptions, dump_list};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all("dumps")?;
    let options = DumpOptions::new("dumps");

    let mut list: RingList<f64> = RingList::init(10, CallSite::here("main"))?;

    let a = list.insert_after(Slot::ANCHOR, 5.0, CallSite::here("main"))?;
    let b = list.insert_after(a, 6.0, CallSite::here("main"))?;
    let c = list.insert_after(b, 7.0, CallSite::here("main"))?;

    let path = dump_list(&list.snapshot(), CallSite::here("main"), &options)?;
    println!("dump written to {}", path.display());

    list.delete(a, CallSite::here("main"))?;
    list.insert_after(c, 4.0, CallSite::here("main"))?;

    let path = dump_list(&list.snapshot(), CallSite::here("main"), &options)?;
    println!("dump written to {}", path.display());

    Ok(())
}

/*!
# I/O Utilities for Saving Chains and ROC Curves to CSV

This module provides functions to save a sampler chain or the points of a fitted
ROC curve to CSV files. Enable via the `csv` feature.
*/

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::errors::Result;

/**
Saves a chain as a CSV file.

The file has a header row `"sample","value"` followed by one row per state,
numbered from 0.

# Examples

```rust
use mini_sdt::io::csv::save_chain_csv;

save_chain_csv(&[0.1, -0.4, 0.3], "/tmp/chain.csv").expect("Expecting saving the chain to succeed");
```
*/
pub fn save_chain_csv<P: AsRef<Path>>(chain: &[f64], filename: P) -> Result<()> {
    let mut wtr = Writer::from_writer(File::create(filename)?);
    wtr.write_record(["sample", "value"])?;

    for (i, value) in chain.iter().enumerate() {
        wtr.write_record(&[i.to_string(), value.to_string()])?;
    }

    wtr.flush()?;
    Ok(())
}

/**
Saves `(false_alarm_rate, hit_rate)` points, e.g. from
[`RocFit::curve`](crate::roc::RocFit::curve), as a CSV file with header
`"false_alarm_rate","hit_rate"`.
*/
pub fn save_roc_csv<P, I>(points: I, filename: P) -> Result<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = (f64, f64)>,
{
    let mut wtr = Writer::from_writer(File::create(filename)?);
    wtr.write_record(["false_alarm_rate", "hit_rate"])?;

    for (fa, hit) in points {
        wtr.write_record(&[fa.to_string(), hit.to_string()])?;
    }

    wtr.flush()?;
    Ok(())
}

/*!
# Saving Chains to CSV

Writes reversible-jump chains, together with their acceptance traces, to a CSV
file. Enable via the `csv` feature.
*/

use std::error::Error;
use std::fs::File;

use csv::Writer;

use crate::core::AcceptanceTrace;
use crate::state::StateVector;

/**
Saves one or more chains as a CSV file.

The file has a header row `chain,sample,accepted,dim_0,dim_1,…` and one row per
recorded state. `accepted` is `1` if the proposal of that iteration was accepted
and `0` otherwise.

# Arguments

* `chains` - The chains, one `Vec<StateVector>` each.
* `traces` - The matching acceptance traces, one per chain.
* `filename` - The file path where the CSV data will be written.

# Errors

Fails if the numbers of chains and traces differ, if a trace is not as long as
its chain, if the states do not all have the same length, or on any I/O or CSV
formatting error.

# Examples

```rust
use discrete_mcmc::io::csv::save_csv;
use discrete_mcmc::sample;
use discrete_mcmc::state::StateVector;

let flat = |_: &StateVector, _: &()| 0.0;
let (chain, trace) = sample(&[0, 1, 0], flat, (), 50, Some(1))?;
save_csv(&[chain], &[trace], "/tmp/rjmcmc.csv")?;
# Ok::<(), Box<dyn std::error::Error>>(())
```
*/
pub fn save_csv(
    chains: &[Vec<StateVector>],
    traces: &[AcceptanceTrace],
    filename: &str,
) -> Result<(), Box<dyn Error>> {
    if chains.len() != traces.len() {
        return Err(format!(
            "got {} chains but {} acceptance traces",
            chains.len(),
            traces.len()
        )
        .into());
    }
    let n_dims = chains
        .iter()
        .flat_map(|chain| chain.first())
        .map(StateVector::len)
        .next()
        .unwrap_or(0);

    let mut wtr = Writer::from_writer(File::create(filename)?);

    let mut header: Vec<String> = vec!["chain".into(), "sample".into(), "accepted".into()];
    header.extend((0..n_dims).map(|i| format!("dim_{}", i)));
    wtr.write_record(&header)?;

    for (chain_idx, (chain, trace)) in chains.iter().zip(traces).enumerate() {
        if chain.len() != trace.len() {
            return Err(format!(
                "chain {chain_idx} has {} states but {} acceptance flags",
                chain.len(),
                trace.len()
            )
            .into());
        }
        for (sample_idx, (state, &accepted)) in chain.iter().zip(trace).enumerate() {
            if state.len() != n_dims {
                return Err(format!(
                    "state {sample_idx} of chain {chain_idx} has length {}, expected {n_dims}",
                    state.len()
                )
                .into());
            }
            let mut row = vec![
                chain_idx.to_string(),
                sample_idx.to_string(),
                u8::from(accepted).to_string(),
            ];
            row.extend(state.as_slice().iter().map(|b| b.to_string()));
            wtr.write_record(&row)?;
        }
    }

    wtr.flush()?;
    Ok(())
}

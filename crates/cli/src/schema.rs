use schemars::schema_for;
use serde_json::json;
use symgraph_api::{NodeRecord, RelationshipRecord};

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let schema = json!({
        "node": schema_for!(NodeRecord),
        "relationship": schema_for!(RelationshipRecord),
    });
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

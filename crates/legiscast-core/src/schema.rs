/// Arrow schemas and record batches for normalized legislative rows.
pub mod tables {
    use std::sync::Arc;

    use arrow::array::{
        ArrayRef, BooleanArray, Date32Array, ListBuilder, StringArray, StringBuilder,
    };
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::error::ArrowError;
    use arrow::record_batch::RecordBatch;
    use chrono::NaiveDate;

    use crate::record::{ActionRecord, CosponsorRecord};

    /// Schema for one row per legislative action.
    pub fn actions_schema() -> Schema {
        Schema::new(vec![
            Field::new("date", DataType::Date32, true),
            Field::new("raw_date", DataType::Utf8, false),
            Field::new("text", DataType::Utf8, false),
            Field::new("action_type", DataType::Utf8, false),
            Field::new("action_code", DataType::Utf8, false),
            Field::new("source_chamber", DataType::Utf8, false),
            Field::new(
                "committees",
                DataType::List(Arc::new(Field::new("item", DataType::Utf8, true))),
                false,
            ),
        ])
    }

    /// Schema for one row per cosponsor.
    pub fn cosponsors_schema() -> Schema {
        Schema::new(vec![
            Field::new("name", DataType::Utf8, false),
            Field::new("party", DataType::Utf8, false),
            Field::new("state", DataType::Utf8, false),
            Field::new("district", DataType::Utf8, false),
            Field::new("joined_date", DataType::Date32, true),
            Field::new("is_original", DataType::Boolean, false),
        ])
    }

    pub fn actions_batch(actions: &[ActionRecord]) -> Result<RecordBatch, ArrowError> {
        let mut committees = ListBuilder::new(StringBuilder::new());
        for a in actions {
            for c in &a.committees {
                committees.values().append_value(c);
            }
            committees.append(true);
        }

        let columns: Vec<ArrayRef> = vec![
            Arc::new(Date32Array::from(
                actions.iter().map(|a| a.date.map(to_date32)).collect::<Vec<_>>(),
            )),
            Arc::new(strings(actions.iter().map(|a| a.raw_date.as_str()))),
            Arc::new(strings(actions.iter().map(|a| a.text.as_str()))),
            Arc::new(strings(actions.iter().map(|a| a.action_type.as_str()))),
            Arc::new(strings(actions.iter().map(|a| a.action_code.as_str()))),
            Arc::new(strings(actions.iter().map(|a| a.source_chamber.as_str()))),
            Arc::new(committees.finish()),
        ];
        RecordBatch::try_new(Arc::new(actions_schema()), columns)
    }

    pub fn cosponsors_batch(cosponsors: &[CosponsorRecord]) -> Result<RecordBatch, ArrowError> {
        let columns: Vec<ArrayRef> = vec![
            Arc::new(strings(cosponsors.iter().map(|c| c.name.as_str()))),
            Arc::new(strings(cosponsors.iter().map(|c| c.party.code()))),
            Arc::new(strings(cosponsors.iter().map(|c| c.state.as_str()))),
            Arc::new(strings(cosponsors.iter().map(|c| c.district.as_str()))),
            Arc::new(Date32Array::from(
                cosponsors
                    .iter()
                    .map(|c| c.joined_date.map(to_date32))
                    .collect::<Vec<_>>(),
            )),
            Arc::new(BooleanArray::from(
                cosponsors.iter().map(|c| c.is_original).collect::<Vec<_>>(),
            )),
        ];
        RecordBatch::try_new(Arc::new(cosponsors_schema()), columns)
    }

    fn strings<'a>(values: impl Iterator<Item = &'a str>) -> StringArray {
        StringArray::from(values.collect::<Vec<_>>())
    }

    /// Days since the Unix epoch, as Arrow's `Date32` stores them.
    fn to_date32(date: NaiveDate) -> i32 {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
        date.signed_duration_since(epoch).num_days() as i32
    }
}

#[cfg(test)]
mod tests {
    use super::tables;
    use crate::record::{ActionRecord, CosponsorRecord, Party};
    use arrow::array::{Array, BooleanArray, Date32Array, ListArray, StringArray};
    use chrono::NaiveDate;

    #[test]
    fn actions_schema_has_expected_fields() {
        let schema = tables::actions_schema();
        assert_eq!(schema.fields().len(), 7);
        assert!(schema.field_with_name("source_chamber").is_ok());
        assert!(schema.field_with_name("committees").is_ok());
    }

    #[test]
    fn cosponsors_schema_has_expected_fields() {
        let schema = tables::cosponsors_schema();
        assert_eq!(schema.fields().len(), 6);
        assert!(schema.field_with_name("is_original").is_ok());
    }

    #[test]
    fn actions_batch_rows_and_nulls() {
        let actions = vec![
            ActionRecord {
                date: NaiveDate::from_ymd_opt(1970, 1, 11),
                text: "Introduced".into(),
                committees: vec!["Judiciary".into(), "Finance".into()],
                ..Default::default()
            },
            ActionRecord {
                raw_date: "garbled".into(),
                text: "Referred".into(),
                ..Default::default()
            },
        ];
        let batch = tables::actions_batch(&actions).unwrap();
        assert_eq!(batch.num_rows(), 2);

        let dates = batch
            .column_by_name("date")
            .unwrap()
            .as_any()
            .downcast_ref::<Date32Array>()
            .unwrap();
        assert_eq!(dates.value(0), 10);
        assert!(dates.is_null(1));

        let texts = batch
            .column_by_name("text")
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(texts.value(1), "Referred");

        let committees = batch
            .column_by_name("committees")
            .unwrap()
            .as_any()
            .downcast_ref::<ListArray>()
            .unwrap();
        assert_eq!(committees.value(0).len(), 2);
        assert_eq!(committees.value(1).len(), 0);
    }

    #[test]
    fn cosponsors_batch_flags() {
        let cos = vec![CosponsorRecord {
            name: "Rep. A".into(),
            party: Party::Republican,
            state: "TX".into(),
            district: "3".into(),
            joined_date: None,
            is_original: true,
        }];
        let batch = tables::cosponsors_batch(&cos).unwrap();
        let flags = batch
            .column_by_name("is_original")
            .unwrap()
            .as_any()
            .downcast_ref::<BooleanArray>()
            .unwrap();
        assert!(flags.value(0));
        let party = batch
            .column_by_name("party")
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(party.value(0), "R");
    }

    #[test]
    fn empty_batches_are_valid() {
        assert_eq!(tables::actions_batch(&[]).unwrap().num_rows(), 0);
        assert_eq!(tables::cosponsors_batch(&[]).unwrap().num_rows(), 0);
    }
}

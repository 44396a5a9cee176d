//! Lazy aggregation: one summary row, or one row per GROUP BY key.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use tagql_core::{Column, CompareOption, Context, Hash256, Record, Result};

use crate::expr::ValueReader;
use crate::query::Query;
use crate::traits::{BoxIter, RecordIterator, Step};

use super::{AggregateSpec, AggregatorBox};

type Finish = Arc<dyn Fn(&Context, &Record) -> Result<Record> + Send + Sync>;

impl Query {
    /// One row holding each aggregate's result, columns named after their aliases.
    /// Empty input still yields a row.
    pub fn aggregate_with(&self, specs: Vec<AggregateSpec>) -> Query {
        self.summarize(specs, None)
    }

    /// `aggregate_with` then `finish` on the summary row.
    pub fn aggregate_with_func<F>(&self, specs: Vec<AggregateSpec>, finish: F) -> Query
    where
        F: Fn(&Context, &Record) -> Result<Record> + Send + Sync + 'static,
    {
        self.summarize(specs, Some(Arc::new(finish)))
    }

    fn summarize(&self, specs: Vec<AggregateSpec>, finish: Option<Finish>) -> Query {
        let parent = self.clone();
        let specs = Arc::new(specs);
        Query::new(move || {
            Box::new(Summarize {
                src: Some(parent.start()),
                specs: Arc::clone(&specs),
                finish: finish.clone(),
            })
        })
    }

    /// GROUP BY: one row per distinct key tuple in first-seen order, key
    /// columns first, then one column per spec.
    pub fn group_by_aggregate(
        &self,
        keys: Vec<(String, ValueReader)>,
        specs: Vec<AggregateSpec>,
    ) -> Query {
        let parent = self.clone();
        let keys = Arc::new(keys);
        let specs = Arc::new(specs);
        Query::new(move || {
            Box::new(GroupBy {
                src: Some(parent.start()),
                keys: Arc::clone(&keys),
                specs: Arc::clone(&specs),
                out: Vec::new().into_iter(),
            })
        })
    }
}

fn output_columns<'a>(names: impl Iterator<Item = &'a str>) -> Vec<Column> {
    names.map(Column::new).collect()
}

fn results(aggs: &[AggregatorBox]) -> Result<Vec<tagql_core::Value>> {
    aggs.iter().map(|a| a.result()).collect()
}

struct Summarize {
    src: Option<BoxIter>,
    specs: Arc<Vec<AggregateSpec>>,
    finish: Option<Finish>,
}

impl RecordIterator for Summarize {
    fn name(&self) -> &'static str {
        "aggregate"
    }

    fn next(&mut self, ctx: &Context) -> Result<Step> {
        let Some(mut src) = self.src.take() else {
            return Ok(Step::End);
        };
        let mut aggs: Vec<AggregatorBox> = self.specs.iter().map(|s| s.instantiate()).collect();
        loop {
            ctx.check()?;
            match src.next(ctx)? {
                Step::Yield(r) => {
                    for a in aggs.iter_mut() {
                        a.accumulate(ctx, &r)?;
                    }
                }
                Step::End => break,
            }
        }
        let columns = output_columns(self.specs.iter().map(|s| s.name.as_str()));
        let row = Record::new(columns, results(&aggs)?);
        match &self.finish {
            Some(f) => Ok(Step::Yield(f(ctx, &row)?)),
            None => Ok(Step::Yield(row)),
        }
    }
}

struct Group {
    key: Record,
    aggs: Vec<AggregatorBox>,
}

struct GroupBy {
    src: Option<BoxIter>,
    keys: Arc<Vec<(String, ValueReader)>>,
    specs: Arc<Vec<AggregateSpec>>,
    out: std::vec::IntoIter<Record>,
}

impl GroupBy {
    fn build(&self, src: &mut dyn RecordIterator, ctx: &Context) -> Result<Vec<Record>> {
        let mut groups: Vec<Group> = Vec::new();
        let mut index: HashMap<Hash256, Vec<usize>> = HashMap::new();
        loop {
            ctx.check()?;
            let r = match src.next(ctx)? {
                Step::Yield(r) => r,
                Step::End => break,
            };
            let values = self
                .keys
                .iter()
                .map(|(_, read)| read(ctx, &r))
                .collect::<Result<Vec<_>>>()?;
            let key = Record::new(Vec::new(), values);

            let slots = index.entry(key.digest()).or_default();
            let mut found = None;
            for &i in slots.iter() {
                if groups[i].key.equal_to(&key, CompareOption::Strict)? {
                    found = Some(i);
                    break;
                }
            }
            let slot = match found {
                Some(i) => i,
                None => {
                    slots.push(groups.len());
                    groups.push(Group {
                        key,
                        aggs: self.specs.iter().map(|s| s.instantiate()).collect(),
                    });
                    groups.len() - 1
                }
            };
            for a in groups[slot].aggs.iter_mut() {
                a.accumulate(ctx, &r)?;
            }
        }
        trace!(groups = groups.len(), "materialized group by");

        let names = self
            .keys
            .iter()
            .map(|(n, _)| n.as_str())
            .chain(self.specs.iter().map(|s| s.name.as_str()));
        let columns = output_columns(names);
        groups
            .into_iter()
            .map(|g| {
                let mut values = g.key.into_values();
                values.resize(self.keys.len(), tagql_core::Value::Null);
                values.extend(results(&g.aggs)?);
                Ok(Record::new(columns.clone(), values))
            })
            .collect()
    }
}

impl RecordIterator for GroupBy {
    fn name(&self) -> &'static str {
        "group_by"
    }

    fn next(&mut self, ctx: &Context) -> Result<Step> {
        if let Some(mut src) = self.src.take() {
            self.out = self.build(src.as_mut(), ctx)?.into_iter();
        }
        ctx.check()?;
        Ok(match self.out.next() {
            Some(r) => Step::Yield(r),
            None => Step::End,
        })
    }
}

//! Read-only pharmacogenomic reference data.
//!
//! The knowledge base is assembled from five versioned tables (`genes`,
//! `alleles`, `phenotypes`, `drugs`, `rules`). Adding a gene, drug or dosing
//! rule is a change to these tables only. All lookups are total: unknown
//! combinations return `None` or [`Phenotype::Indeterminate`] instead of
//! failing.

use super::tables::{read_table, Table};
use super::types::{Action, AlleleFunction, Mechanism, Phenotype};
use crate::utils::{open_table_reader, optional_cell, split_list, Result};
use semver::Version;
use serde::Serialize;
use std::{
    collections::{HashMap, HashSet},
    io::BufRead,
    path::Path,
};

const GENES_TABLE: &str = "genes";
const ALLELES_TABLE: &str = "alleles";
const PHENOTYPES_TABLE: &str = "phenotypes";
const DRUGS_TABLE: &str = "drugs";
const RULES_TABLE: &str = "rules";

const BUILTIN_TABLES: [(&str, &str); 5] = [
    (GENES_TABLE, include_str!("../../data/genes.tsv")),
    (ALLELES_TABLE, include_str!("../../data/alleles.tsv")),
    (PHENOTYPES_TABLE, include_str!("../../data/phenotypes.tsv")),
    (DRUGS_TABLE, include_str!("../../data/drugs.tsv")),
    (RULES_TABLE, include_str!("../../data/rules.tsv")),
];

#[derive(Debug, Clone, PartialEq)]
pub struct AlleleDefinition {
    pub name: String,
    pub rsid: Option<String>,
    pub function: AlleleFunction,
    /// Position within the gene's allele table; fixes the display order of
    /// diplotypes and breaks ties between equally ranked alleles.
    pub order: usize,
}

#[derive(Debug, Clone)]
pub struct GeneDefinition {
    pub symbol: String,
    pub reference_allele: String,
    /// Allele functions from most to least reportable.
    pub allele_priority: Vec<AlleleFunction>,
    pub alleles: Vec<AlleleDefinition>,
}

impl GeneDefinition {
    pub fn allele_by_rsid(&self, rsid: &str) -> Option<&AlleleDefinition> {
        self.alleles
            .iter()
            .find(|a| a.rsid.as_deref().is_some_and(|r| r.eq_ignore_ascii_case(rsid)))
    }

    pub fn allele_by_name(&self, name: &str) -> Option<&AlleleDefinition> {
        self.alleles.iter().find(|a| a.name == name)
    }

    pub fn reference(&self) -> &AlleleDefinition {
        // Presence of the reference allele is checked when the tables are loaded
        self.allele_by_name(&self.reference_allele)
            .unwrap_or(&self.alleles[0])
    }

    /// Rank of an allele function in the priority list; lower ranks win.
    pub fn priority_rank(&self, function: AlleleFunction) -> usize {
        self.allele_priority
            .iter()
            .position(|&f| f == function)
            .unwrap_or(self.allele_priority.len())
    }

    /// Renders two alleles as a diplotype in allele-table order.
    pub fn diplotype(&self, first: &AlleleDefinition, second: &AlleleDefinition) -> String {
        let (a, b) = if first.order <= second.order {
            (first, second)
        } else {
            (second, first)
        };
        format!("{}/{}", a.name, b.name)
    }

    /// Normalizes a diplotype string ("*3/*1" -> "*1/*3"); `None` if it does
    /// not name two alleles of this gene.
    pub fn canonical_diplotype(&self, diplotype: &str) -> Option<String> {
        let (first, second) = diplotype.trim().split_once('/')?;
        let first = self.allele_by_name(first.trim())?;
        let second = self.allele_by_name(second.trim())?;
        Some(self.diplotype(first, second))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DosingRule {
    pub gene: String,
    pub phenotype: Phenotype,
    pub drug: String,
    pub action: Action,
    pub mechanism: Mechanism,
    pub initial_dose: Option<String>,
    pub alternatives: Vec<String>,
    pub monitoring: Vec<String>,
    pub guideline: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrugDefinition {
    pub name: String,
    pub gene: String,
    pub drug_class: Option<String>,
}

#[derive(Debug)]
pub struct KnowledgeBase {
    version: Version,
    genes: HashMap<String, GeneDefinition>,
    drugs: Vec<DrugDefinition>,
    phenotypes: HashMap<(String, String), Phenotype>,
    rules: HashMap<(String, Phenotype, String), DosingRule>,
}

impl KnowledgeBase {
    /// Loads the tables compiled into the binary.
    pub fn builtin() -> Result<Self> {
        Self::load(|name| {
            let data = BUILTIN_TABLES
                .iter()
                .find(|(table, _)| *table == name)
                .map(|(_, data)| *data)
                .ok_or_else(|| format!("No built-in table named {}", name))?;
            Ok(Box::new(data.as_bytes()))
        })
    }

    /// Loads `<name>.tsv` (or `<name>.tsv.gz`) tables from a directory.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        Self::load(|name| {
            let plain = dir.join(format!("{}.tsv", name));
            let gzipped = dir.join(format!("{}.tsv.gz", name));
            let path = if plain.exists() { plain } else { gzipped };
            if !path.exists() {
                return Err(format!(
                    "Knowledge base table not found: {}",
                    dir.join(format!("{}.tsv", name)).display()
                ));
            }
            log::debug!("Loading knowledge base table {}", path.display());
            Ok(Box::new(open_table_reader(&path)?))
        })
    }

    fn load<F>(mut open: F) -> Result<Self>
    where
        F: FnMut(&str) -> Result<Box<dyn BufRead>>,
    {
        let mut read = |name: &str, field_count: usize| -> Result<Table> {
            read_table(name, open(name)?, field_count)
        };
        let genes = read(GENES_TABLE, 3)?;
        let alleles = read(ALLELES_TABLE, 4)?;
        let phenotypes = read(PHENOTYPES_TABLE, 3)?;
        let drugs = read(DRUGS_TABLE, 3)?;
        let rules = read(RULES_TABLE, 10)?;
        Self::from_tables(genes, alleles, phenotypes, drugs, rules)
    }

    fn from_tables(
        genes: Table,
        alleles: Table,
        phenotypes: Table,
        drugs: Table,
        rules: Table,
    ) -> Result<Self> {
        let version = genes.version.clone();
        for table in [&alleles, &phenotypes, &drugs, &rules] {
            if table.version != version {
                return Err(format!(
                    "Knowledge base version mismatch: {} is {}, {} is {}",
                    genes.name, version, table.name, table.version
                ));
            }
        }

        let mut kb = KnowledgeBase {
            version,
            genes: HashMap::new(),
            drugs: Vec::new(),
            phenotypes: HashMap::new(),
            rules: HashMap::new(),
        };
        kb.add_genes(&genes)?;
        kb.add_alleles(&alleles)?;
        kb.add_phenotypes(&phenotypes)?;
        kb.add_drugs(&drugs)?;
        kb.add_rules(&rules)?;

        log::debug!(
            "Loaded knowledge base v{}: {} genes, {} drugs, {} diplotypes, {} rules",
            kb.version,
            kb.genes.len(),
            kb.drugs.len(),
            kb.phenotypes.len(),
            kb.rules.len()
        );
        Ok(kb)
    }

    fn add_genes(&mut self, table: &Table) -> Result<()> {
        for row in &table.rows {
            let error = |msg: String| format!("Error at {} line {}: {}", table.name, row.line, msg);
            let symbol = row.field(0).to_uppercase();
            let priority = row
                .field(2)
                .split(',')
                .map(|f| f.parse::<AlleleFunction>())
                .collect::<Result<Vec<_>>>()
                .map_err(error)?;
            if priority.iter().collect::<HashSet<_>>().len() != priority.len() {
                return Err(error("Duplicate function in allele priority".to_string()));
            }

            let gene = GeneDefinition {
                symbol: symbol.clone(),
                reference_allele: row.field(1).to_string(),
                allele_priority: priority,
                alleles: Vec::new(),
            };
            if self.genes.insert(symbol.clone(), gene).is_some() {
                return Err(error(format!("Duplicate gene '{}'", symbol)));
            }
        }
        Ok(())
    }

    fn add_alleles(&mut self, table: &Table) -> Result<()> {
        let mut seen_rsids = HashSet::new();
        for row in &table.rows {
            let error = |msg: String| format!("Error at {} line {}: {}", table.name, row.line, msg);
            let gene = self
                .genes
                .get_mut(&row.field(0).to_uppercase())
                .ok_or_else(|| error(format!("Unknown gene '{}'", row.field(0))))?;
            let function = row.field(3).parse::<AlleleFunction>().map_err(error)?;
            if !gene.allele_priority.contains(&function) {
                return Err(error(format!(
                    "Function '{}' is missing from the {} allele priority",
                    function, gene.symbol
                )));
            }
            let name = row.field(1).to_string();
            if gene.allele_by_name(&name).is_some() {
                return Err(error(format!("Duplicate allele '{}'", name)));
            }
            let rsid = optional_cell(row.field(2));
            if let Some(rsid) = &rsid {
                if !seen_rsids.insert(rsid.to_lowercase()) {
                    return Err(error(format!("Duplicate rsID '{}'", rsid)));
                }
            }
            let order = gene.alleles.len();
            gene.alleles.push(AlleleDefinition {
                name,
                rsid,
                function,
                order,
            });
        }

        for gene in self.genes.values() {
            if gene.allele_by_name(&gene.reference_allele).is_none() {
                return Err(format!(
                    "Reference allele {} of {} is not defined in {}",
                    gene.reference_allele, gene.symbol, table.name
                ));
            }
        }
        Ok(())
    }

    fn add_phenotypes(&mut self, table: &Table) -> Result<()> {
        for row in &table.rows {
            let error = |msg: String| format!("Error at {} line {}: {}", table.name, row.line, msg);
            let gene = self
                .gene(row.field(0))
                .ok_or_else(|| error(format!("Unknown gene '{}'", row.field(0))))?;
            let diplotype = gene
                .canonical_diplotype(row.field(1))
                .ok_or_else(|| error(format!("Invalid diplotype '{}'", row.field(1))))?;
            let phenotype = row.field(2).parse::<Phenotype>().map_err(error)?;
            let key = (gene.symbol.clone(), diplotype);
            if self.phenotypes.insert(key, phenotype).is_some() {
                return Err(error(format!("Duplicate diplotype '{}'", row.field(1))));
            }
        }
        Ok(())
    }

    fn add_drugs(&mut self, table: &Table) -> Result<()> {
        for row in &table.rows {
            let error = |msg: String| format!("Error at {} line {}: {}", table.name, row.line, msg);
            let name = row.field(0).to_uppercase();
            let gene = self
                .gene(row.field(1))
                .ok_or_else(|| error(format!("Unknown gene '{}'", row.field(1))))?
                .symbol
                .clone();
            if self.drug(&name).is_some() {
                return Err(error(format!("Duplicate drug '{}'", name)));
            }
            self.drugs.push(DrugDefinition {
                name,
                gene,
                drug_class: optional_cell(row.field(2)),
            });
        }
        Ok(())
    }

    fn add_rules(&mut self, table: &Table) -> Result<()> {
        for row in &table.rows {
            let error = |msg: String| format!("Error at {} line {}: {}", table.name, row.line, msg);
            let gene = self
                .gene(row.field(0))
                .ok_or_else(|| error(format!("Unknown gene '{}'", row.field(0))))?
                .symbol
                .clone();
            let phenotype = row.field(1).parse::<Phenotype>().map_err(error)?;
            let drug = self
                .drug(row.field(2))
                .ok_or_else(|| error(format!("Unknown drug '{}'", row.field(2))))?;
            if drug.gene != gene {
                return Err(error(format!(
                    "Rule gene {} does not match the primary gene {} of {}",
                    gene, drug.gene, drug.name
                )));
            }
            let drug = drug.name.clone();

            let rule = DosingRule {
                gene: gene.clone(),
                phenotype,
                drug: drug.clone(),
                action: row.field(3).parse::<Action>().map_err(error)?,
                mechanism: row.field(4).parse::<Mechanism>().map_err(error)?,
                initial_dose: optional_cell(row.field(5)),
                alternatives: split_list(row.field(6)),
                monitoring: split_list(row.field(7)),
                guideline: row.field(8).to_string(),
                notes: optional_cell(row.field(9)).unwrap_or_default(),
            };
            if self.rules.insert((gene, phenotype, drug), rule).is_some() {
                return Err(error("Duplicate rule".to_string()));
            }
        }
        Ok(())
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn gene(&self, symbol: &str) -> Option<&GeneDefinition> {
        self.genes.get(&symbol.trim().to_uppercase())
    }

    pub fn drug(&self, name: &str) -> Option<&DrugDefinition> {
        let name = name.trim();
        self.drugs.iter().find(|d| d.name.eq_ignore_ascii_case(name))
    }

    /// Supported drugs in table order.
    pub fn drugs(&self) -> &[DrugDefinition] {
        &self.drugs
    }

    pub fn supported_drugs(&self) -> impl Iterator<Item = &str> {
        self.drugs.iter().map(|d| d.name.as_str())
    }

    pub fn primary_gene_for(&self, drug: &str) -> Option<&str> {
        self.drug(drug).map(|d| d.gene.as_str())
    }

    /// Phenotype implied by a diplotype; `Indeterminate` for unknown genes or
    /// diplotypes without a table entry.
    pub fn phenotype_for(&self, gene: &str, diplotype: &str) -> Phenotype {
        let Some(gene) = self.gene(gene) else {
            return Phenotype::Indeterminate;
        };
        gene.canonical_diplotype(diplotype)
            .and_then(|d| self.phenotypes.get(&(gene.symbol.clone(), d)))
            .copied()
            .unwrap_or(Phenotype::Indeterminate)
    }

    pub fn dosing_rule_for(&self, gene: &str, phenotype: Phenotype, drug: &str) -> Option<&DosingRule> {
        let key = (
            gene.trim().to_uppercase(),
            phenotype,
            drug.trim().to_uppercase(),
        );
        self.rules.get(&key)
    }

    pub fn allele_by_rsid(&self, gene: &str, rsid: &str) -> Option<&AlleleDefinition> {
        self.gene(gene)?.allele_by_rsid(rsid)
    }

    /// Gene whose allele table defines `rsid`.
    pub fn gene_for_rsid(&self, rsid: &str) -> Option<&GeneDefinition> {
        self.genes
            .values()
            .find(|gene| gene.allele_by_rsid(rsid).is_some())
    }
}

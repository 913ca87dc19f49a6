#![allow(dead_code)]

use anyhow::{bail, Result};
use rtf2md::{
    engine::{Backend, ConversionRequest, Fidelity, ProbeOut},
    install::{Installer, Prompter},
};
use std::cell::Cell;
use std::rc::Rc;

pub struct FakeBackend {
    pub id: &'static str,
    pub fidelity: Fidelity,
    pub installed: Rc<Cell<bool>>,
    pub fail_on: Vec<&'static str>,
    pub probes: Rc<Cell<usize>>,
    pub converts: Rc<Cell<usize>>,
}

impl FakeBackend {
    pub fn new(id: &'static str, fidelity: Fidelity, installed: bool) -> Self {
        Self {
            id,
            fidelity,
            installed: Rc::new(Cell::new(installed)),
            fail_on: Vec::new(),
            probes: Rc::new(Cell::new(0)),
            converts: Rc::new(Cell::new(0)),
        }
    }

    pub fn high(installed: bool) -> Self {
        Self::new("pandoc", Fidelity::High, installed)
    }

    pub fn fallback() -> Self {
        Self::new("striprtf", Fidelity::Fallback, true)
    }

    pub fn failing_on(mut self, stem: &'static str) -> Self {
        self.fail_on.push(stem);
        self
    }
}

impl Backend for FakeBackend {
    fn id(&self) -> &str {
        self.id
    }

    fn label(&self) -> &str {
        match self.fidelity {
            Fidelity::High => "fake high fidelity",
            Fidelity::Fallback => "fake fallback",
        }
    }

    fn fidelity(&self) -> Fidelity {
        self.fidelity
    }

    fn probe(&self) -> ProbeOut {
        self.probes.set(self.probes.get() + 1);
        if self.installed.get() {
            ProbeOut::ok("fake 1.0")
        } else {
            ProbeOut::missing("not installed")
        }
    }

    fn convert(&self, req: &ConversionRequest) -> Result<String> {
        self.converts.set(self.converts.get() + 1);
        let stem = req.stem();
        if self.fail_on.iter().any(|s| *s == stem) {
            bail!("{} choked on {}", self.id, stem);
        }
        Ok(format!("\n{} text for {}\n\n\n\nend  \n\n", self.id, stem))
    }
}

pub struct FakeInstaller {
    pub succeed: bool,
    /// Flipped to installed on success.
    pub target: Option<Rc<Cell<bool>>>,
    pub calls: Rc<Cell<usize>>,
}

impl FakeInstaller {
    pub fn unused() -> Self {
        Self {
            succeed: false,
            target: None,
            calls: Rc::new(Cell::new(0)),
        }
    }

    pub fn installing(target: &Rc<Cell<bool>>) -> Self {
        Self {
            succeed: true,
            target: Some(Rc::clone(target)),
            calls: Rc::new(Cell::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            succeed: false,
            target: None,
            calls: Rc::new(Cell::new(0)),
        }
    }
}

impl Installer for FakeInstaller {
    fn install(&self) -> Result<()> {
        self.calls.set(self.calls.get() + 1);
        if !self.succeed {
            bail!("package manager exploded");
        }
        if let Some(t) = &self.target {
            t.set(true);
        }
        Ok(())
    }
}

pub struct CountingPrompter {
    pub answer: bool,
    pub asked: usize,
}

impl CountingPrompter {
    pub fn answering(answer: bool) -> Self {
        Self { answer, asked: 0 }
    }
}

impl Prompter for CountingPrompter {
    fn confirm(&mut self, _question: &str) -> Result<bool> {
        self.asked += 1;
        Ok(self.answer)
    }
}

pub fn boxed(backends: Vec<FakeBackend>) -> Vec<Box<dyn Backend>> {
    backends
        .into_iter()
        .map(|b| Box::new(b) as Box<dyn Backend>)
        .collect()
}

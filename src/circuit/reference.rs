//! Reference circuits used by the demo binary and the test suite.

use super::builder::{Circuit, CircuitBuilder};
use crate::error::Result;

pub const KOHM: f64 = 1000.0;
pub const FF: f64 = 1e-15;

/// Element values of the coupled-lines testcase.
#[derive(Debug, Clone, Copy)]
pub struct CoupledLines {
    /// Driver output resistance
    pub r_drv: f64,
    /// Resistance of each "pi" stage
    pub pi_r: f64,
    /// Capacitance of each "pi" stage, split evenly between its ends
    pub pi_c: f64,
    /// Coupling capacitance between the two line centers
    pub coupl_c: f64,
    /// Receiver input capacitance
    pub rcvr_c: f64,
}

impl Default for CoupledLines {
    fn default() -> Self {
        Self {
            r_drv: 0.1 * KOHM,
            pi_r: 1.0 * KOHM,
            pi_c: 100.0 * FF,
            coupl_c: 100.0 * FF,
            rcvr_c: 20.0 * FF,
        }
    }
}

impl CoupledLines {
    /// Build the circuit.
    ///
    /// Two identical lines, aggressor and victim, each made of a driver, two
    /// pi stages and a receiver. The lines couple through one capacitor
    /// between their center nodes. States: 8 node voltages
    /// (vagg, n1, n2, n3, vvic, n5, n6, n7) then 2 source currents.
    /// Input 0 drives the aggressor, input 1 the victim; output 0 is the
    /// aggressor receiver, output 1 the victim receiver.
    pub fn build(&self) -> Result<Circuit> {
        let mut b = CircuitBuilder::new();
        self.add_line(&mut b, "agg", "vagg", ["n1", "n2", "n3"])?;
        self.add_line(&mut b, "vic", "vvic", ["n5", "n6", "n7"])?;

        let (a, v) = (b.node("n2"), b.node("n6"));
        b.add_capacitor("Ccoupl", a, v, self.coupl_c)?;

        b.build()
    }

    fn add_line(&self, b: &mut CircuitBuilder, prefix: &str, drv: &str, mid: [&str; 3]) -> Result<()> {
        let gnd = b.node("0");
        let drv = b.node(drv);
        let [n1, n2, n3] = mid.map(|name| b.node(name));

        b.add_voltage_source(&format!("V{prefix}"), drv)?;
        b.add_resistor(&format!("Rdrv_{prefix}"), drv, n1, self.r_drv)?;
        // first "pi"
        b.add_capacitor(&format!("C1a_{prefix}"), n1, gnd, self.pi_c / 2.0)?;
        b.add_resistor(&format!("R1_{prefix}"), n1, n2, self.pi_r)?;
        b.add_capacitor(&format!("C1b_{prefix}"), n2, gnd, self.pi_c / 2.0)?;
        // second "pi"
        b.add_capacitor(&format!("C2a_{prefix}"), n2, gnd, self.pi_c / 2.0)?;
        b.add_resistor(&format!("R2_{prefix}"), n2, n3, self.pi_r)?;
        b.add_capacitor(&format!("C2b_{prefix}"), n3, gnd, self.pi_c / 2.0)?;
        // receiver
        b.add_capacitor(&format!("Crcvr_{prefix}"), n3, gnd, self.rcvr_c)?;
        b.add_output(n3)?;
        Ok(())
    }
}

/// The coupled-lines testcase with its standard element values.
pub fn coupled_lines() -> Result<Circuit> {
    CoupledLines::default().build()
}

/// A single-pole divider: a source drives `r_series` into node `out`, which
/// has `r_shunt` and `c` to ground. Output 0 is V(out).
pub fn rc_divider(r_series: f64, r_shunt: f64, c: f64) -> Result<Circuit> {
    let mut b = CircuitBuilder::new();
    let vin = b.node("in");
    let out = b.node("out");
    let gnd = b.node("0");
    b.add_voltage_source("VIN", vin)?;
    b.add_resistor("R1", vin, out, r_series)?;
    b.add_resistor("R2", out, gnd, r_shunt)?;
    b.add_capacitor("C1", out, gnd, c)?;
    b.add_output(out)?;
    b.build()
}
